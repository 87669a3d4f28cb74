// Dense spatial indices owned by `Grid`.
//
// `Occupancy` is a flat 3D array of `Option<CellId>` indexed by
// `x + z * size_x + y * size_x * size_z`, so "is there a cell here, and
// which one" is a single bounds check plus a load. Out-of-bounds reads return
// `None`; out-of-bounds writes are no-ops.
//
// `ProjectionPlanes` is one 2D flag plane per perspective over the screen
// plane. Projections of in-grid voxels span
// `[-(size_y - 1), size_x + size_y - 2]` horizontally (same shape along z),
// so each plane is offset by `size_y - 1`. Grid uses one of these as the
// "some cell projects here" index, rebuilt on every add/remove, and a second
// one for prohibited projections that accumulate during generation.
//
// See also: `grid.rs` which owns both, `cell.rs` which reads `Occupancy`
// during connectivity.
//
// **Critical constraint: determinism.** Plain vectors, no hashing.

use crate::geometry::{Perspective, project};
use crate::types::{CellId, GridPosition, ScreenProjection};
use serde::{Deserialize, Serialize};

/// Dense 3D map from position to the cell standing there.
#[derive(Clone, Debug, Default)]
pub struct Occupancy {
    /// Flat storage: index = x + z * size_x + y * size_x * size_z.
    slots: Vec<Option<CellId>>,
    pub size_x: u32,
    pub size_y: u32,
    pub size_z: u32,
}

impl Occupancy {
    pub fn new(size_x: u32, size_y: u32, size_z: u32) -> Self {
        let total = (size_x as usize) * (size_y as usize) * (size_z as usize);
        Self {
            slots: vec![None; total],
            size_x,
            size_y,
            size_z,
        }
    }

    pub fn in_bounds(&self, pos: GridPosition) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && pos.z >= 0
            && (pos.x as u32) < self.size_x
            && (pos.y as u32) < self.size_y
            && (pos.z as u32) < self.size_z
    }

    fn index(&self, pos: GridPosition) -> Option<usize> {
        if !self.in_bounds(pos) {
            return None;
        }
        let sx = self.size_x as usize;
        let sz = self.size_z as usize;
        Some(pos.x as usize + pos.z as usize * sx + pos.y as usize * sx * sz)
    }

    /// The cell at `pos`, or `None` for empty or out-of-bounds positions.
    pub fn get(&self, pos: GridPosition) -> Option<CellId> {
        self.index(pos).and_then(|i| self.slots[i])
    }

    pub fn is_occupied(&self, pos: GridPosition) -> bool {
        self.get(pos).is_some()
    }

    /// Write a slot. No-op out of bounds.
    pub fn set(&mut self, pos: GridPosition, cell: Option<CellId>) {
        if let Some(i) = self.index(pos) {
            self.slots[i] = cell;
        }
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }

    /// Height bound used for column enumeration.
    pub fn height(&self) -> i32 {
        self.size_y as i32
    }
}

/// One boolean plane per perspective over the screen projection domain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionPlanes {
    /// Flat storage: index = perspective * (width * depth) + px + pz * width,
    /// with `px = proj.x + offset`, `pz = proj.z + offset`.
    flags: Vec<bool>,
    width: u32,
    depth: u32,
    offset: i32,
}

impl ProjectionPlanes {
    /// Planes sized for a grid of the given dimensions.
    pub fn for_grid(size_x: u32, size_y: u32, size_z: u32) -> Self {
        let rise = size_y.saturating_sub(1);
        let width = size_x + 2 * rise;
        let depth = size_z + 2 * rise;
        let per_plane = (width as usize) * (depth as usize);
        Self {
            flags: vec![false; per_plane * Perspective::COUNT],
            width,
            depth,
            offset: rise as i32,
        }
    }

    fn index(&self, perspective: Perspective, proj: ScreenProjection) -> Option<usize> {
        let px = proj.x + self.offset;
        let pz = proj.z + self.offset;
        if px < 0 || pz < 0 || px as u32 >= self.width || pz as u32 >= self.depth {
            return None;
        }
        let per_plane = (self.width as usize) * (self.depth as usize);
        Some(perspective.index() * per_plane + px as usize + pz as usize * self.width as usize)
    }

    /// Whether these planes have the shape `for_grid()` gives the same
    /// dimensions.
    pub fn fits_grid(&self, size_x: u32, size_y: u32, size_z: u32) -> bool {
        let fresh = Self::for_grid(size_x, size_y, size_z);
        self.width == fresh.width
            && self.depth == fresh.depth
            && self.offset == fresh.offset
            && self.flags.len() == fresh.flags.len()
    }

    /// Whether `proj` is flagged in `perspective`'s plane. Outside the plane
    /// is never flagged.
    pub fn contains(&self, perspective: Perspective, proj: ScreenProjection) -> bool {
        self.index(perspective, proj)
            .is_some_and(|i| self.flags[i])
    }

    /// Flag `proj`. Returns `false` if it lies outside the plane.
    pub fn insert(&mut self, perspective: Perspective, proj: ScreenProjection) -> bool {
        match self.index(perspective, proj) {
            Some(i) => {
                self.flags[i] = true;
                true
            }
            None => false,
        }
    }

    /// Flag the projection of `pos` in `perspective`'s plane.
    pub fn insert_position(&mut self, perspective: Perspective, pos: GridPosition) -> bool {
        self.insert(perspective, project(pos, perspective))
    }

    /// Whether `pos` projects onto a flagged screen cell under `perspective`.
    pub fn contains_position(&self, perspective: Perspective, pos: GridPosition) -> bool {
        self.contains(perspective, project(pos, perspective))
    }

    pub fn clear(&mut self) {
        self.flags.iter_mut().for_each(|f| *f = false);
    }

    /// Number of flagged screen cells in one plane.
    pub fn count(&self, perspective: Perspective) -> usize {
        let per_plane = (self.width as usize) * (self.depth as usize);
        let start = perspective.index() * per_plane;
        self.flags[start..start + per_plane]
            .iter()
            .filter(|&&f| f)
            .count()
    }
}
