// Perspective and direction tables, isometric projection, occlusion lookup.
//
// The camera sits at one of four fixed yaw angles. Under each one, height
// shears a voxel's (x, z) footprint diagonally on screen, so voxels at
// different heights can share a screen cell. Those coincidences are what
// create the perspective-dependent walkways.
//
//   perspective   angle   screen (x, z)      view direction
//   SE             45°    (x - y, z + y)     NW
//   SW            135°    (x + y, z + y)     NE
//   NW            225°    (x + y, z - y)     SE
//   NE            315°    (x - y, z - y)     SW
//
// `shift_to_height()` inverts the shear: it returns the voxel at a chosen
// height that lands on the same screen cell. `all_shifts_to_height()`
// walks a whole column of such voxels, which is how connectivity finds
// every cell that could visually meet a neighbour offset.
//
// `OCCLUDED_WHEN_HIGHER` is the fixed table that decides which of two
// stacked-on-screen voxels wins when a connection crosses a height step.
//
// See also: `cell.rs` which consumes all of this in `update_connectivity()`,
// `occupancy.rs` for the dense planes indexed by `Perspective::index()`.

use crate::types::{GridPosition, ScreenProjection};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Plane directions
// ---------------------------------------------------------------------------

/// A unit step in the horizontal (x, z) plane.
///
/// The four cardinals come first so `index()` doubles as a row index into
/// four-wide tables such as `OCCLUDED_WHEN_HIGHER`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlaneDirection {
    North,
    East,
    South,
    West,
    SouthEast,
    SouthWest,
    NorthWest,
    NorthEast,
}

impl PlaneDirection {
    /// Movement and connection labels.
    pub const CARDINALS: [PlaneDirection; 4] = [
        PlaneDirection::North,
        PlaneDirection::East,
        PlaneDirection::South,
        PlaneDirection::West,
    ];

    pub const ALL: [PlaneDirection; 8] = [
        PlaneDirection::North,
        PlaneDirection::East,
        PlaneDirection::South,
        PlaneDirection::West,
        PlaneDirection::SouthEast,
        PlaneDirection::SouthWest,
        PlaneDirection::NorthWest,
        PlaneDirection::NorthEast,
    ];

    /// 0..4 for cardinals, 4..8 for diagonals.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_cardinal(self) -> bool {
        self.index() < 4
    }

    /// `(dx, dz)` unit offset.
    pub const fn offset(self) -> (i32, i32) {
        match self {
            PlaneDirection::North => (0, 1),
            PlaneDirection::NorthEast => (1, 1),
            PlaneDirection::East => (1, 0),
            PlaneDirection::SouthEast => (1, -1),
            PlaneDirection::South => (0, -1),
            PlaneDirection::SouthWest => (-1, -1),
            PlaneDirection::West => (-1, 0),
            PlaneDirection::NorthWest => (-1, 1),
        }
    }

    pub const fn opposite(self) -> PlaneDirection {
        match self {
            PlaneDirection::North => PlaneDirection::South,
            PlaneDirection::East => PlaneDirection::West,
            PlaneDirection::South => PlaneDirection::North,
            PlaneDirection::West => PlaneDirection::East,
            PlaneDirection::SouthEast => PlaneDirection::NorthWest,
            PlaneDirection::SouthWest => PlaneDirection::NorthEast,
            PlaneDirection::NorthWest => PlaneDirection::SouthEast,
            PlaneDirection::NorthEast => PlaneDirection::SouthWest,
        }
    }

    /// Apply this step to a grid position, keeping its height.
    pub const fn step(self, pos: GridPosition) -> GridPosition {
        let (dx, dz) = self.offset();
        pos.offset(dx, dz)
    }
}

impl fmt::Display for PlaneDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlaneDirection::North => "N",
            PlaneDirection::East => "E",
            PlaneDirection::South => "S",
            PlaneDirection::West => "W",
            PlaneDirection::SouthEast => "SE",
            PlaneDirection::SouthWest => "SW",
            PlaneDirection::NorthWest => "NW",
            PlaneDirection::NorthEast => "NE",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Perspectives
// ---------------------------------------------------------------------------

/// One of the four fixed camera positions, named after the corner the
/// camera looks from.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Perspective {
    SouthEast,
    SouthWest,
    NorthWest,
    #[default]
    NorthEast,
}

impl Perspective {
    /// Clockwise camera order, which is also the index order.
    pub const ALL: [Perspective; 4] = [
        Perspective::SouthEast,
        Perspective::SouthWest,
        Perspective::NorthWest,
        Perspective::NorthEast,
    ];

    pub const COUNT: usize = 4;

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_index(index: usize) -> Option<Perspective> {
        match index {
            0 => Some(Perspective::SouthEast),
            1 => Some(Perspective::SouthWest),
            2 => Some(Perspective::NorthWest),
            3 => Some(Perspective::NorthEast),
            _ => None,
        }
    }

    /// Camera yaw in degrees.
    pub const fn angle(self) -> u32 {
        match self {
            Perspective::SouthEast => 45,
            Perspective::SouthWest => 135,
            Perspective::NorthWest => 225,
            Perspective::NorthEast => 315,
        }
    }

    /// Horizontal direction the camera looks along. Also the screen-space
    /// direction a voxel drifts in when raised by one level.
    pub const fn view_direction(self) -> PlaneDirection {
        match self {
            Perspective::SouthEast => PlaneDirection::NorthWest,
            Perspective::SouthWest => PlaneDirection::NorthEast,
            Perspective::NorthWest => PlaneDirection::SouthEast,
            Perspective::NorthEast => PlaneDirection::SouthWest,
        }
    }

    pub const fn clockwise(self) -> Perspective {
        match self {
            Perspective::SouthEast => Perspective::SouthWest,
            Perspective::SouthWest => Perspective::NorthWest,
            Perspective::NorthWest => Perspective::NorthEast,
            Perspective::NorthEast => Perspective::SouthEast,
        }
    }

    pub const fn counter_clockwise(self) -> Perspective {
        match self {
            Perspective::SouthEast => Perspective::NorthEast,
            Perspective::SouthWest => Perspective::SouthEast,
            Perspective::NorthWest => Perspective::SouthWest,
            Perspective::NorthEast => Perspective::NorthWest,
        }
    }

    /// The perspective whose fixed angle is nearest to `degrees`, measured
    /// around the circle. Used by the camera to snap after a drag.
    ///
    /// Exact midpoints go to the earlier perspective in `ALL`.
    pub fn closest_to_angle(degrees: f32) -> Perspective {
        let a = degrees.rem_euclid(360.0);
        let mut best = Perspective::SouthEast;
        let mut best_dist = f32::INFINITY;
        for p in Perspective::ALL {
            let raw = (p.angle() as f32 - a).abs();
            let dist = raw.min(360.0 - raw);
            if dist < best_dist {
                best_dist = dist;
                best = p;
            }
        }
        best
    }

    /// Parse the short names used by config files and the CLI.
    pub fn from_short_name(name: &str) -> Option<Perspective> {
        match name.to_ascii_lowercase().as_str() {
            "se" => Some(Perspective::SouthEast),
            "sw" => Some(Perspective::SouthWest),
            "nw" => Some(Perspective::NorthWest),
            "ne" => Some(Perspective::NorthEast),
            _ => None,
        }
    }
}

impl fmt::Display for Perspective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Perspective::SouthEast => "SE",
            Perspective::SouthWest => "SW",
            Perspective::NorthWest => "NW",
            Perspective::NorthEast => "NE",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Orthographic isometric projection of a voxel onto the screen plane.
pub const fn project(pos: GridPosition, perspective: Perspective) -> ScreenProjection {
    let GridPosition { x, y, z } = pos;
    match perspective {
        Perspective::SouthEast => ScreenProjection::new(x - y, z + y),
        Perspective::SouthWest => ScreenProjection::new(x + y, z + y),
        Perspective::NorthWest => ScreenProjection::new(x + y, z - y),
        Perspective::NorthEast => ScreenProjection::new(x - y, z - y),
    }
}

/// The voxel at height `target_y` that projects onto the same screen cell as
/// `pos` under `perspective`.
pub const fn shift_to_height(
    pos: GridPosition,
    perspective: Perspective,
    target_y: i32,
) -> GridPosition {
    let diff = pos.y - target_y;
    let (x, z) = (pos.x, pos.z);
    match perspective {
        Perspective::SouthEast => GridPosition::new(x - diff, target_y, z + diff),
        Perspective::SouthWest => GridPosition::new(x + diff, target_y, z + diff),
        Perspective::NorthWest => GridPosition::new(x + diff, target_y, z - diff),
        Perspective::NorthEast => GridPosition::new(x - diff, target_y, z - diff),
    }
}

/// Every voxel in heights `from_y..to_y` that shares `pos`'s screen cell,
/// lowest first. The results may lie outside the grid; callers bound-check.
pub fn all_shifts_to_height(
    pos: GridPosition,
    perspective: Perspective,
    from_y: i32,
    to_y: i32,
) -> impl Iterator<Item = GridPosition> {
    (from_y..to_y).map(move |y| shift_to_height(pos, perspective, y))
}

// ---------------------------------------------------------------------------
// Occlusion
// ---------------------------------------------------------------------------

/// `OCCLUDED_WHEN_HIGHER[perspective][direction]`: whether a neighbour
/// candidate found in `direction` is hidden when it sits *higher* than the
/// evaluating cell (`true`) or when it sits *lower* (`false`).
///
/// Rows follow `Perspective::index()`, columns `PlaneDirection::index()`
/// (N, E, S, W).
pub const OCCLUDED_WHEN_HIGHER: [[bool; 4]; 4] = [
    // SE
    [true, false, false, true],
    // SW
    [true, true, false, false],
    // NW
    [false, true, true, false],
    // NE
    [false, false, true, true],
];

/// Table lookup. Diagonals never carry connections and are never occluded.
pub const fn occluded_when_higher(perspective: Perspective, direction: PlaneDirection) -> bool {
    if direction.is_cardinal() {
        OCCLUDED_WHEN_HIGHER[perspective.index()][direction.index()]
    } else {
        false
    }
}

/// Whether a candidate at `candidate_y` is hidden from a cell at `self_y`.
/// Equal heights are never occluded.
pub const fn is_occluded(
    perspective: Perspective,
    direction: PlaneDirection,
    self_y: i32,
    candidate_y: i32,
) -> bool {
    if candidate_y == self_y {
        return false;
    }
    (candidate_y > self_y) == occluded_when_higher(perspective, direction)
}
