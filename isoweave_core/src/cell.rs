// One voxel of the puzzle and its per-perspective connections.
//
// A `Cell` has a fixed `GridPosition`, its four screen projections cached at
// creation, a monotonic `planted` flag, and one `ConnectionTable` per
// perspective. Tables store neighbour *handles* (`CellId`), never cells;
// `Grid` owns every cell and is the only mutator.
//
// ## Connectivity rules
//
// `update_connectivity()` fills each (perspective, cardinal direction) slot:
//
//   1. Physical block: a cell standing directly above the same-height step
//      target makes that direction a wall. If the check position is outside
//      the grid, nothing blocks.
//   2. Candidates: every occupied voxel on the screen column of the step
//      target, walked lowest-first with `all_shifts_to_height()`.
//   3. Occlusion: unequal heights lose per `OCCLUDED_WHEN_HIGHER`.
//   4. Visual block: a third cell on the screen cell one view-direction
//      step past the higher endpoint, at any height in
//      `lower.y + 1 ..= higher.y`, hides the seam.
//   5. Overlap: when two survivors share a slot, the strictly higher one
//      wins. Equal heights keep the first registered.
//
// Occlusion alone is symmetric between the two ends of a seam; physical and
// visual blocking are not, so A seeing B in direction D does not guarantee B
// sees A in `D.opposite()`.
//
// See also: `geometry.rs` for projection and the occlusion table,
// `occupancy.rs` for the dense index read here, `grid.rs` which calls
// `update_connectivity()` on every structural change.

use crate::geometry::{
    Perspective, PlaneDirection, all_shifts_to_height, is_occluded, project, shift_to_height,
};
use crate::occupancy::Occupancy;
use crate::types::{CellId, GridPosition, ScreenProjection};
use log::debug;
use smallvec::SmallVec;

/// Connections of one cell under one perspective.
///
/// Held twice: a dense slot array for "who is north of me" lookups and a
/// labelled list for iteration and reverse lookups.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionTable {
    slots: [Option<CellId>; 4],
    labelled: SmallVec<[(PlaneDirection, CellId); 4]>,
}

impl ConnectionTable {
    /// Neighbour in a cardinal direction. Diagonals are always empty.
    pub fn neighbor(&self, direction: PlaneDirection) -> Option<CellId> {
        if direction.is_cardinal() {
            self.slots[direction.index()]
        } else {
            None
        }
    }

    /// Direction label under which `cell` is connected, if it is.
    pub fn direction_to(&self, cell: CellId) -> Option<PlaneDirection> {
        self.labelled
            .iter()
            .find(|(_, id)| *id == cell)
            .map(|(dir, _)| *dir)
    }

    pub fn contains(&self, cell: CellId) -> bool {
        self.direction_to(cell).is_some()
    }

    /// `(direction, neighbour)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (PlaneDirection, CellId)> + '_ {
        self.labelled.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.labelled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labelled.is_empty()
    }

    /// Put `cell` into `direction`'s slot, replacing whatever was there.
    fn set(&mut self, direction: PlaneDirection, cell: CellId) {
        let i = direction.index();
        if self.slots[i].is_some() {
            self.labelled.retain(|(dir, _)| *dir != direction);
        }
        self.slots[i] = Some(cell);
        self.labelled.push((direction, cell));
    }
}

/// A voxel in the puzzle grid.
#[derive(Clone, Debug)]
pub struct Cell {
    id: CellId,
    position: GridPosition,
    projections: [ScreenProjection; 4],
    planted: bool,
    connections: [ConnectionTable; 4],
}

impl Cell {
    /// A fresh, unplanted cell with no connections yet.
    pub fn new(id: CellId, position: GridPosition) -> Self {
        Self {
            id,
            position,
            projections: Perspective::ALL.map(|p| project(position, p)),
            planted: false,
            connections: Default::default(),
        }
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn position(&self) -> GridPosition {
        self.position
    }

    pub fn height(&self) -> i32 {
        self.position.y
    }

    pub fn projection(&self, perspective: Perspective) -> ScreenProjection {
        self.projections[perspective.index()]
    }

    pub fn is_planted(&self) -> bool {
        self.planted
    }

    /// Mark visited. Returns `true` only the first time.
    pub fn plant(&mut self) -> bool {
        !std::mem::replace(&mut self.planted, true)
    }

    pub fn connections(&self, perspective: Perspective) -> &ConnectionTable {
        &self.connections[perspective.index()]
    }

    pub fn neighbor(&self, perspective: Perspective, direction: PlaneDirection) -> Option<CellId> {
        self.connections(perspective).neighbor(direction)
    }

    pub fn direction_to(&self, perspective: Perspective, other: CellId) -> Option<PlaneDirection> {
        self.connections(perspective).direction_to(other)
    }

    /// Recompute every perspective's table from the occupancy index.
    pub fn update_connectivity(&mut self, occupancy: &Occupancy) {
        for p in Perspective::ALL {
            self.connections[p.index()] = self.connectivity_for(p, occupancy);
        }
    }

    fn connectivity_for(&self, perspective: Perspective, occupancy: &Occupancy) -> ConnectionTable {
        let mut table = ConnectionTable::default();
        // Height of the cell currently holding each slot.
        let mut slot_heights: [Option<i32>; 4] = [None; 4];

        for direction in PlaneDirection::CARDINALS {
            if is_physically_blocked(occupancy, self.position, direction) {
                continue;
            }
            let target = direction.step(self.position);

            for candidate in all_shifts_to_height(target, perspective, 0, occupancy.height()) {
                let Some(other) = occupancy.get(candidate) else {
                    continue;
                };
                if other == self.id {
                    continue;
                }
                if is_occluded(perspective, direction, self.position.y, candidate.y) {
                    continue;
                }
                if is_visually_blocked(occupancy, perspective, self.position, candidate) {
                    continue;
                }

                let slot = &mut slot_heights[direction.index()];
                match *slot {
                    None => {
                        *slot = Some(candidate.y);
                        table.set(direction, other);
                    }
                    Some(held) if candidate.y > held => {
                        debug!(
                            "{} {perspective}/{direction}: overlap at {}, keeping higher {other} (y={}) over y={held}",
                            self.id,
                            project(target, perspective),
                            candidate.y,
                        );
                        *slot = Some(candidate.y);
                        table.set(direction, other);
                    }
                    Some(_) => {}
                }
            }
        }

        table
    }
}

/// Whether a cell stands directly above the same-height step from `from` in
/// `direction`. Out-of-grid checks never block.
pub fn is_physically_blocked(
    occupancy: &Occupancy,
    from: GridPosition,
    direction: PlaneDirection,
) -> bool {
    let above_target = direction.step(from).raised(1);
    occupancy.in_bounds(above_target) && occupancy.is_occupied(above_target)
}

/// Whether a third cell hides the seam between `a` and `b` under
/// `perspective`.
///
/// Probes the screen cell one view-direction step beyond the higher
/// endpoint, at every height from just above the lower endpoint up to the
/// higher one. Equal heights have an empty probe range.
pub fn is_visually_blocked(
    occupancy: &Occupancy,
    perspective: Perspective,
    a: GridPosition,
    b: GridPosition,
) -> bool {
    let (lower, higher) = if a.y <= b.y { (a, b) } else { (b, a) };
    let beyond = perspective.view_direction().step(higher);
    (lower.y + 1..=higher.y).any(|h| {
        let probe = shift_to_height(beyond, perspective, h);
        probe != a && probe != b && occupancy.is_occupied(probe)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build occupancy + cells for a hand-placed layout and run connectivity.
    fn layout(positions: &[GridPosition]) -> (Occupancy, Vec<Cell>) {
        let mut occ = Occupancy::new(9, 9, 9);
        let mut cells: Vec<Cell> = positions
            .iter()
            .enumerate()
            .map(|(i, &pos)| Cell::new(CellId(i as u32), pos))
            .collect();
        for cell in &cells {
            occ.set(cell.position(), Some(cell.id()));
        }
        for cell in &mut cells {
            cell.update_connectivity(&occ);
        }
        (occ, cells)
    }

    #[test]
    fn new_cell_caches_projections() {
        let pos = GridPosition::new(3, 1, 2);
        let cell = Cell::new(CellId(0), pos);
        for p in Perspective::ALL {
            assert_eq!(cell.projection(p), project(pos, p));
        }
        assert!(!cell.is_planted());
        assert!(cell.connections(Perspective::NorthEast).is_empty());
    }

    #[test]
    fn plant_is_monotonic() {
        let mut cell = Cell::new(CellId(0), GridPosition::new(0, 0, 0));
        assert!(cell.plant());
        assert!(!cell.plant());
        assert!(cell.is_planted());
    }

    #[test]
    fn flat_neighbours_connect_with_opposite_labels() {
        let a = GridPosition::new(0, 0, 0);
        let east = GridPosition::new(1, 0, 0);
        let north = GridPosition::new(0, 0, 1);
        let (_, cells) = layout(&[a, east, north]);
        let p = Perspective::NorthEast;

        assert_eq!(cells[0].neighbor(p, PlaneDirection::East), Some(CellId(1)));
        assert_eq!(cells[1].neighbor(p, PlaneDirection::West), Some(CellId(0)));
        assert_eq!(cells[0].neighbor(p, PlaneDirection::North), Some(CellId(2)));
        assert_eq!(cells[2].neighbor(p, PlaneDirection::South), Some(CellId(0)));

        // (1,0,0) and (0,0,1) are diagonal, never adjacent.
        assert!(!cells[1].connections(p).contains(CellId(2)));
        assert!(!cells[2].connections(p).contains(CellId(1)));
        assert_eq!(cells[1].connections(p).len(), 1);
        assert_eq!(cells[2].connections(p).len(), 1);
    }

    #[test]
    fn same_height_neighbours_connect_in_every_perspective() {
        let (_, cells) = layout(&[GridPosition::new(4, 2, 4), GridPosition::new(4, 2, 3)]);
        for p in Perspective::ALL {
            assert_eq!(cells[0].neighbor(p, PlaneDirection::South), Some(CellId(1)), "{p}");
            assert_eq!(cells[1].neighbor(p, PlaneDirection::North), Some(CellId(0)), "{p}");
        }
    }

    #[test]
    fn stacked_cell_does_not_occlude_flat_east_neighbour_under_se() {
        // OCCLUDED_WHEN_HIGHER[SE][E] == false: the flat seam survives even
        // with a cell stacked on the evaluating cell.
        let base = GridPosition::new(0, 0, 0);
        let above = GridPosition::new(0, 1, 0);
        let east = GridPosition::new(1, 0, 0);
        let (_, cells) = layout(&[base, above, east]);
        let p = Perspective::SouthEast;

        assert_eq!(cells[0].neighbor(p, PlaneDirection::East), Some(CellId(2)));
        assert!(!cells[1].connections(p).contains(CellId(2)));
        // The stacked cell stands on the east cell's west step.
        assert_eq!(cells[2].neighbor(p, PlaneDirection::West), None);
    }

    #[test]
    fn raised_neighbour_connects_across_a_height_step() {
        // Under NE, (3,1,2) shares a screen cell with (2,0,1), the east step of (1,0,1).
        let low = GridPosition::new(1, 0, 1);
        let high = GridPosition::new(3, 1, 2);
        let (_, cells) = layout(&[low, high]);
        let p = Perspective::NorthEast;

        assert_eq!(cells[0].neighbor(p, PlaneDirection::East), Some(CellId(1)));
        assert_eq!(cells[1].neighbor(p, PlaneDirection::West), Some(CellId(0)));
        // The shear is perspective-specific.
        assert!(cells[0].connections(Perspective::SouthWest).is_empty());
    }

    #[test]
    fn higher_candidate_visibility_follows_the_table() {
        // Under NE, (1,1,3) shares a screen cell with (0,0,2), the north step
        // of (0,0,1). NE/N hides lower candidates, NE/S hides higher ones,
        // so the seam is visible from both ends.
        let low = GridPosition::new(0, 0, 1);
        let high = GridPosition::new(1, 1, 3);
        let (_, cells) = layout(&[low, high]);
        let p = Perspective::NorthEast;
        assert_eq!(cells[0].neighbor(p, PlaneDirection::North), Some(CellId(1)));
        assert_eq!(cells[1].neighbor(p, PlaneDirection::South), Some(CellId(0)));
    }

    #[test]
    fn occluded_candidate_is_discarded() {
        // Under SE, raising the north step of (1,0,1) by one lands on
        // (2,1,1). SE/N hides higher candidates and SE/S hides lower ones.
        let from = GridPosition::new(1, 0, 1);
        let north_high = shift_to_height(GridPosition::new(1, 0, 2), Perspective::SouthEast, 1);
        assert_eq!(north_high, GridPosition::new(2, 1, 1));

        let (_, cells) = layout(&[from, north_high]);
        let p = Perspective::SouthEast;
        assert_eq!(cells[0].neighbor(p, PlaneDirection::North), None);
        assert_eq!(cells[1].neighbor(p, PlaneDirection::South), None);
    }

    #[test]
    fn physical_block_breaks_symmetry() {
        // (1,0,1) -> E -> (3,1,2) under NE. A cell at (2,2,2) stands on the
        // west step of the high end, walling it off, but says nothing about
        // the low end's east step.
        let low = GridPosition::new(1, 0, 1);
        let high = GridPosition::new(3, 1, 2);
        let wall = GridPosition::new(2, 2, 2);
        let (occ, cells) = layout(&[low, high, wall]);
        let p = Perspective::NorthEast;

        assert!(is_physically_blocked(&occ, high, PlaneDirection::West));
        assert!(!is_physically_blocked(&occ, low, PlaneDirection::East));
        assert_eq!(cells[0].neighbor(p, PlaneDirection::East), Some(CellId(1)));
        assert_eq!(cells[1].neighbor(p, PlaneDirection::West), None);
    }

    #[test]
    fn stacked_third_cell_visually_blocks_the_seam() {
        // (2,1,1) sits one SW step past the high end at its height: it both
        // walls the low end's east step and hides the seam for the high end.
        let low = GridPosition::new(1, 0, 1);
        let high = GridPosition::new(3, 1, 2);
        let blocker = GridPosition::new(2, 1, 1);
        let (occ, cells) = layout(&[low, high, blocker]);
        let p = Perspective::NorthEast;

        assert!(is_visually_blocked(&occ, p, high, low));
        assert_eq!(cells[0].neighbor(p, PlaneDirection::East), None);
        assert_eq!(cells[1].neighbor(p, PlaneDirection::West), None);
    }

    #[test]
    fn physical_block_out_of_bounds_never_blocks() {
        let occ = Occupancy::new(2, 1, 2);
        // Above-target is at y = 1, outside a one-level grid.
        let origin = GridPosition::new(0, 0, 0);
        assert!(!is_physically_blocked(&occ, origin, PlaneDirection::East));
    }

    #[test]
    fn overlap_keeps_the_higher_cell() {
        // Under NE the east step of (1,0,1) is (2,0,1); (3,1,2) projects there
        // too. Both survive occlusion (equal height / NE-E visible higher).
        let from = GridPosition::new(1, 0, 1);
        let flat = GridPosition::new(2, 0, 1);
        let raised = GridPosition::new(3, 1, 2);
        let (_, cells) = layout(&[from, flat, raised]);
        assert_eq!(
            cells[0].neighbor(Perspective::NorthEast, PlaneDirection::East),
            Some(CellId(2)),
        );
        // Other perspectives only see the flat neighbour.
        assert_eq!(
            cells[0].neighbor(Perspective::SouthWest, PlaneDirection::East),
            Some(CellId(1)),
        );
    }

    #[test]
    fn connection_table_slot_and_list_agree() {
        let mut table = ConnectionTable::default();
        table.set(PlaneDirection::North, CellId(4));
        table.set(PlaneDirection::East, CellId(5));
        table.set(PlaneDirection::North, CellId(6));

        assert_eq!(table.neighbor(PlaneDirection::North), Some(CellId(6)));
        assert_eq!(table.direction_to(CellId(6)), Some(PlaneDirection::North));
        assert_eq!(table.direction_to(CellId(4)), None);
        assert_eq!(table.len(), 2);
        assert_eq!(table.neighbor(PlaneDirection::NorthEast), None);
        let labels: Vec<_> = table.iter().map(|(d, _)| d).collect();
        assert_eq!(labels, vec![PlaneDirection::East, PlaneDirection::North]);
    }
}
