// Core value types shared across the crate.
//
// `GridPosition` is a voxel coordinate, `ScreenProjection` is where that
// voxel lands on the 2D screen plane under some perspective, `CellId`
// is the stable handle Grid hands out for each cell it owns, and
// `CellState` is the per-cell classification a presentation layer maps to
// materials.
//
// Everything here is `Copy` and compares by value.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A voxel position in the bounded puzzle grid.
///
/// `y` is the vertical axis. `x` grows east, `z` grows north, matching the
/// plane direction offsets in `geometry.rs`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridPosition {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The same column, `dy` levels up (negative for down).
    pub const fn raised(self, dy: i32) -> Self {
        Self::new(self.x, self.y + dy, self.z)
    }

    /// Shift in the horizontal plane by `(dx, dz)`, keeping the height.
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y, self.z + dz)
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A point on the 2D screen plane produced by `geometry::project()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScreenProjection {
    pub x: i32,
    pub z: i32,
}

impl ScreenProjection {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }
}

impl fmt::Display for ScreenProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}>", self.x, self.z)
    }
}

// ---------------------------------------------------------------------------
// Cell handles
// ---------------------------------------------------------------------------

/// Stable handle for a cell owned by `Grid`.
///
/// Ids are sequential and never reused within one grid, so a handle held by
/// a collaborator across a level advance simply stops resolving instead of
/// aliasing a newer cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub u32);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cell#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Presentation-facing classification
// ---------------------------------------------------------------------------

/// How a cell relates to the player under the active perspective.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    /// The player's cell.
    Current,
    /// Visited at some point. Permanent.
    Planted,
    /// Not planted, reachable without rotating the camera.
    Plantable,
    /// Not planted, reachable only through one or more rotations.
    Reachable,
    /// No sequence of moves and rotations leads there.
    Unreachable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_compare_by_value() {
        assert_eq!(GridPosition::new(1, 2, 3), GridPosition::new(1, 2, 3));
        assert_ne!(GridPosition::new(1, 2, 3), GridPosition::new(1, 3, 2));
    }

    #[test]
    fn raised_and_offset_touch_one_axis_group() {
        let p = GridPosition::new(4, 1, 4);
        assert_eq!(p.raised(2), GridPosition::new(4, 3, 4));
        assert_eq!(p.offset(-1, 1), GridPosition::new(3, 1, 5));
    }

    #[test]
    fn cell_ids_are_ordered() {
        // BTreeMap<CellId, _> iteration order is creation order.
        assert!(CellId(3) < CellId(10));
    }

    #[test]
    fn display_formats() {
        assert_eq!(GridPosition::new(1, -2, 3).to_string(), "(1, -2, 3)");
        assert_eq!(ScreenProjection::new(0, 5).to_string(), "<0, 5>");
        assert_eq!(CellId(7).to_string(), "Cell#7");
    }
}
