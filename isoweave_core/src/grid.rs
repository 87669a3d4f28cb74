// The puzzle grid: cell ownership, derived indices, and gameplay queries.
//
// `Grid` owns every `Cell` in a `BTreeMap<CellId, Cell>` and is the only
// place cells are created, removed or mutated. Around that collection it
// keeps derived state that is rebuilt from scratch by
// `rebuild_derived_state()` on every structural change:
//
// - `occupancy`: dense 3D index, position -> CellId.
// - `projected`: per-perspective "some cell projects here" flags.
// - connection tables inside each cell (`Cell::update_connectivity()`).
// - `order`: dense cell order, sorted by id; a cell's index in `order` is its
//   row in every path matrix.
// - one `PathMatrices` per perspective over the n cells, and one over the
//   4n (cell, perspective) nodes with unit-cost rotation edges between the
//   four nodes of each cell. The solver weights every edge 1, so a camera
//   turn costs the same as a move and distances count both.
//
// The prohibited-projection planes are *not* derived: they accumulate
// during generation (see `generation.rs`) and are only cleared on level
// advance.
//
// Mutations (`set_perspective`, `set_current_cell`, `advance_level`)
// return `Vec<GridEvent>`. Queries never fail; a handle that no longer
// resolves simply yields `None` / `false`.
//
// See also: `cell.rs` for connectivity rules, `pathfinding.rs` for the
// solver, `generation.rs` for placement and level advance, `route.rs` for
// full route reconstruction, `snapshot.rs` for serialization.
//
// **Critical constraint: determinism.** All iteration is over `BTreeMap` or
// dense vectors in id order.

use crate::cell::Cell;
use crate::config::{ConfigError, GridConfig};
use crate::event::GridEvent;
use crate::generation::PlacementRejection;
use crate::geometry::Perspective;
use crate::occupancy::{Occupancy, ProjectionPlanes};
use crate::pathfinding::{EdgeMatrix, PathMatrices, floyd_warshall};
use crate::route::InterPerspectiveWaypoint;
use crate::types::{CellId, CellState, GridPosition, ScreenProjection};
use isoweave_prng::PuzzleRng;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
pub struct Grid {
    pub(crate) config: GridConfig,
    pub(crate) rng: PuzzleRng,
    pub(crate) level: u32,
    pub(crate) perspective: Perspective,
    pub(crate) current: CellId,
    pub(crate) next_cell_id: u32,
    pub(crate) cells: BTreeMap<CellId, Cell>,
    pub(crate) prohibited: ProjectionPlanes,

    // Derived. Rebuilt by `rebuild_derived_state()`.
    pub(crate) occupancy: Occupancy,
    pub(crate) projected: ProjectionPlanes,
    pub(crate) order: Vec<CellId>,
    pub(crate) matrices: [PathMatrices; Perspective::COUNT],
    pub(crate) inter_perspective: PathMatrices,
    /// Last states handed out through `CellStateChanged` events.
    pub(crate) published: BTreeMap<CellId, CellState>,
}

impl Grid {
    /// A grid holding only the planted seed cell at `config.start_position`.
    pub fn new(config: GridConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let (sx, sy, sz) = config.grid_size;
        let mut grid = Self {
            rng: PuzzleRng::new(seed),
            level: 0,
            perspective: config.start_perspective,
            current: CellId(0),
            next_cell_id: 0,
            cells: BTreeMap::new(),
            prohibited: ProjectionPlanes::for_grid(sx, sy, sz),
            occupancy: Occupancy::new(sx, sy, sz),
            projected: ProjectionPlanes::for_grid(sx, sy, sz),
            order: Vec::new(),
            matrices: Default::default(),
            inter_perspective: PathMatrices::default(),
            published: BTreeMap::new(),
            config,
        };

        let id = grid.allocate_id();
        let mut seed_cell = Cell::new(id, grid.config.start_position);
        seed_cell.plant();
        grid.cells.insert(id, seed_cell);
        grid.current = id;
        grid.rebuild_derived_state();
        grid.published = grid.compute_cell_states();
        Ok(grid)
    }

    /// A grid with level 0 generated around the seed cell.
    pub fn generate(config: GridConfig, seed: u64) -> Result<Self, ConfigError> {
        let mut grid = Self::new(config, seed)?;
        grid.create_cells_around_current();
        grid.published = grid.compute_cell_states();
        Ok(grid)
    }

    pub(crate) fn allocate_id(&mut self) -> CellId {
        let id = CellId(self.next_cell_id);
        self.next_cell_id += 1;
        id
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn perspective(&self) -> Perspective {
        self.perspective
    }

    pub fn current_cell(&self) -> CellId {
        self.current
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    /// All cells in id order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.values()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cell_at(&self, position: GridPosition) -> Option<CellId> {
        self.occupancy.get(position)
    }

    pub fn in_bounds(&self, position: GridPosition) -> bool {
        self.occupancy.in_bounds(position)
    }

    pub fn is_occupied(&self, position: GridPosition) -> bool {
        self.occupancy.is_occupied(position)
    }

    /// Whether any cell projects onto `proj` under `perspective`.
    pub fn is_projected(&self, perspective: Perspective, proj: ScreenProjection) -> bool {
        self.projected.contains(perspective, proj)
    }

    /// Whether `position` is excluded from generation under any perspective.
    pub fn is_prohibited(&self, position: GridPosition) -> bool {
        Perspective::ALL
            .iter()
            .any(|&p| self.prohibited.contains_position(p, position))
    }

    pub fn prohibited_planes(&self) -> &ProjectionPlanes {
        &self.prohibited
    }

    pub fn planted_count(&self) -> usize {
        self.cells.values().filter(|c| c.is_planted()).count()
    }

    pub fn all_planted(&self) -> bool {
        self.cells.values().all(|c| c.is_planted())
    }

    /// Row of `id` in the path matrices.
    pub fn dense_index(&self, id: CellId) -> Option<usize> {
        self.order.binary_search(&id).ok()
    }

    pub fn cell_at_index(&self, index: usize) -> Option<CellId> {
        self.order.get(index).copied()
    }

    pub fn path_matrices(&self, perspective: Perspective) -> &PathMatrices {
        &self.matrices[perspective.index()]
    }

    /// Matrix over (cell, perspective) nodes; see `inter_perspective_node()`.
    pub fn inter_perspective_matrices(&self) -> &PathMatrices {
        &self.inter_perspective
    }

    /// Node index of (cell at dense `index`, `perspective`) in the
    /// inter-perspective matrix.
    pub fn inter_perspective_node(&self, perspective: Perspective, index: usize) -> usize {
        perspective.index() * self.order.len() + index
    }

    // -----------------------------------------------------------------------
    // Derived state
    // -----------------------------------------------------------------------

    /// Insert a cell without any reachability check. Used by generation and
    /// for hand-built layouts.
    pub fn insert_cell(&mut self, position: GridPosition) -> Result<CellId, PlacementRejection> {
        if !self.occupancy.in_bounds(position) {
            return Err(PlacementRejection::OutOfBounds);
        }
        if self.occupancy.is_occupied(position) {
            return Err(PlacementRejection::Occupied);
        }
        let id = self.allocate_id();
        self.cells.insert(id, Cell::new(id, position));
        self.rebuild_derived_state();
        Ok(id)
    }

    /// Remove a cell. The current cell cannot be removed.
    pub fn remove_cell(&mut self, id: CellId) -> bool {
        if id == self.current || self.cells.remove(&id).is_none() {
            return false;
        }
        self.rebuild_derived_state();
        true
    }

    /// Recompute occupancy, projections, connections and path matrices from
    /// the cell collection.
    pub fn rebuild_derived_state(&mut self) {
        self.occupancy.clear();
        self.projected.clear();
        for cell in self.cells.values() {
            self.occupancy.set(cell.position(), Some(cell.id()));
            for p in Perspective::ALL {
                self.projected.insert(p, cell.projection(p));
            }
        }
        self.order = self.cells.keys().copied().collect();

        let occupancy = &self.occupancy;
        for cell in self.cells.values_mut() {
            cell.update_connectivity(occupancy);
        }
        self.rebuild_path_matrices();
    }

    fn rebuild_path_matrices(&mut self) {
        let n = self.order.len();
        let mut combined = EdgeMatrix::new(n * Perspective::COUNT);
        let mut per_perspective: [PathMatrices; Perspective::COUNT] = Default::default();

        for p in Perspective::ALL {
            let mut edges = EdgeMatrix::new(n);
            for (i, id) in self.order.iter().enumerate() {
                let Some(cell) = self.cells.get(id) else {
                    continue;
                };
                for (_, neighbor) in cell.connections(p).iter() {
                    if let Some(j) = self.dense_index(neighbor) {
                        edges.add_edge(i, j);
                        combined.add_edge(p.index() * n + i, p.index() * n + j);
                    }
                }
                for q in Perspective::ALL {
                    combined.add_edge(p.index() * n + i, q.index() * n + i);
                }
            }
            per_perspective[p.index()] = floyd_warshall(&edges);
        }

        self.matrices = per_perspective;
        self.inter_perspective = floyd_warshall(&combined);
    }

    // -----------------------------------------------------------------------
    // Cell states
    // -----------------------------------------------------------------------

    /// State of one cell under the active perspective.
    pub fn cell_state(&self, id: CellId) -> Option<CellState> {
        let cell = self.cells.get(&id)?;
        let state = if id == self.current {
            CellState::Current
        } else if cell.is_planted() {
            CellState::Planted
        } else if self.is_reachable_in(self.perspective, self.current, id) {
            CellState::Plantable
        } else if self
            .inter_perspective_distance(self.perspective, self.current, id)
            .is_some()
        {
            CellState::Reachable
        } else {
            CellState::Unreachable
        };
        Some(state)
    }

    /// Every cell's state, in id order.
    pub fn cell_states(&self) -> Vec<(CellId, CellState)> {
        self.compute_cell_states().into_iter().collect()
    }

    pub(crate) fn compute_cell_states(&self) -> BTreeMap<CellId, CellState> {
        self.cells
            .keys()
            .filter_map(|&id| self.cell_state(id).map(|s| (id, s)))
            .collect()
    }

    /// Diff current states against the last published ones and emit a
    /// `CellStateChanged` for each difference.
    pub fn refresh_cell_states(&mut self) -> Vec<GridEvent> {
        let next = self.compute_cell_states();
        let events = next
            .iter()
            .filter_map(|(&cell, &to)| {
                let from = self.published.get(&cell).copied();
                (from != Some(to)).then_some(GridEvent::CellStateChanged { cell, from, to })
            })
            .collect();
        self.published = next;
        events
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Switch the active perspective. Connection tables cover all four
    /// perspectives already, so only cell states change.
    pub fn set_perspective(&mut self, perspective: Perspective) -> Vec<GridEvent> {
        if perspective == self.perspective {
            return Vec::new();
        }
        let from = std::mem::replace(&mut self.perspective, perspective);
        let mut events = vec![GridEvent::PerspectiveChanged {
            from,
            to: perspective,
        }];
        events.extend(self.refresh_cell_states());
        events
    }

    /// Move the player onto `cell`, planting it. Advances the level once
    /// every cell is planted. Unknown cells and the current cell are no-ops.
    pub fn set_current_cell(&mut self, cell: CellId) -> Vec<GridEvent> {
        if cell == self.current {
            return Vec::new();
        }
        let Some(target) = self.cells.get_mut(&cell) else {
            return Vec::new();
        };

        let mut events = Vec::new();
        if target.plant() {
            events.push(GridEvent::CellPlanted { cell });
        }
        let from = std::mem::replace(&mut self.current, cell);
        events.push(GridEvent::CurrentCellChanged { from, to: cell });

        if self.all_planted() {
            events.extend(self.advance_level());
        } else {
            events.extend(self.refresh_cell_states());
        }
        events
    }

    // -----------------------------------------------------------------------
    // Path queries
    // -----------------------------------------------------------------------

    pub fn is_reachable_in(&self, perspective: Perspective, start: CellId, goal: CellId) -> bool {
        match (self.dense_index(start), self.dense_index(goal)) {
            (Some(s), Some(g)) => self.matrices[perspective.index()].is_reachable(s, g),
            _ => false,
        }
    }

    /// Next cell from the current cell toward `goal` under the active
    /// perspective.
    pub fn successor_on_path(&self, goal: CellId) -> Option<CellId> {
        self.successor_on_path_in(self.perspective, self.current, goal)
    }

    /// Next cell from `start` toward `goal` without rotating away from
    /// `perspective`.
    pub fn successor_on_path_in(
        &self,
        perspective: Perspective,
        start: CellId,
        goal: CellId,
    ) -> Option<CellId> {
        let s = self.dense_index(start)?;
        let g = self.dense_index(goal)?;
        let next = self.matrices[perspective.index()].next_hop(s, g)?;
        self.cell_at_index(next)
    }

    /// Fewest moves plus rotations from (`start`, `perspective`) to `goal`
    /// under any perspective.
    pub fn inter_perspective_distance(
        &self,
        perspective: Perspective,
        start: CellId,
        goal: CellId,
    ) -> Option<u32> {
        let s = self.dense_index(start)?;
        let g = self.dense_index(goal)?;
        let from = self.inter_perspective_node(perspective, s);
        let to = self.closest_goal_node(from, g)?;
        self.inter_perspective.distance(from, to)
    }

    /// The goal's node with the fewest steps from `from`. Ties go to the
    /// lowest perspective index.
    fn closest_goal_node(&self, from: usize, goal_index: usize) -> Option<usize> {
        Perspective::ALL
            .iter()
            .map(|&p| self.inter_perspective_node(p, goal_index))
            .filter_map(|node| self.inter_perspective.distance(from, node).map(|d| (d, node)))
            .min()
            .map(|(_, node)| node)
    }

    /// One step from (`start`, `perspective`) toward `goal` through the
    /// inter-perspective matrix. The step is either a move to a neighbour
    /// (`direction` is set) or an in-place rotation (`cell == start`,
    /// `direction` is `None`). `None` when the goal is unreachable or
    /// already reached.
    pub fn successor_on_path_inter_perspective(
        &self,
        perspective: Perspective,
        start: CellId,
        goal: CellId,
    ) -> Option<InterPerspectiveWaypoint> {
        let n = self.order.len();
        let s = self.dense_index(start)?;
        let g = self.dense_index(goal)?;
        let from = self.inter_perspective_node(perspective, s);
        let to = self.closest_goal_node(from, g)?;
        let next = self.inter_perspective.next_hop(from, to)?;

        let cell = self.cell_at_index(next % n)?;
        let next_perspective = Perspective::from_index(next / n)?;
        let direction = if cell == start {
            None
        } else {
            self.cells.get(&start)?.direction_to(next_perspective, cell)
        };
        Some(InterPerspectiveWaypoint {
            cell,
            perspective: next_perspective,
            direction,
        })
    }

    /// Whether the player can get from their cell to `goal` through any
    /// sequence of moves and rotations. `false` for the current cell.
    pub fn has_inter_perspective_successor_on_path(&self, goal: CellId) -> bool {
        self.successor_on_path_inter_perspective(self.perspective, self.current, goal)
            .is_some()
    }
}
