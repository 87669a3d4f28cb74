// Procedural level generation with a reachability guarantee.
//
// Starting from the current cell, `create_cells_around_current()` grows the
// level one tentative placement at a time:
//
//   1. Collect candidates: every in-grid, unoccupied shift of an existing
//      cell's cardinal step, under every perspective, that is neither
//      already projected nor prohibited. Two config switches drop the
//      active perspective or same-height direct neighbours.
//   2. Pick one with the grid's `PuzzleRng` and place it.
//   3. If any cell can no longer reach the current cell (or be reached from
//      it) through moves and rotations, roll the placement back.
//   4. On acceptance, prohibit the positions above both endpoints of every
//      connection that touches the new cell, in all four planes, so later
//      placements cannot stack into that seam from any camera.
//
// The loop stops at the level target, when the retry budget is spent, or
// when no candidates remain. Falling short is logged and reported, never
// an error.
//
// `advance_level()` clears everything except the current cell, resets the
// prohibited planes, raises the target and regenerates.
//
// See also: `grid.rs` for the indices and matrices consulted here,
// `config.rs` for the counts, budget and variety switches.
//
// **Critical constraint: determinism.** Candidates are sorted before the
// random pick; all randomness comes from the grid's `PuzzleRng`.

use crate::event::GridEvent;
use crate::geometry::{Perspective, PlaneDirection, all_shifts_to_height};
use crate::grid::Grid;
use crate::types::{CellId, GridPosition};
use log::{info, trace, warn};
use std::collections::BTreeSet;
use std::fmt;

/// Why a forced placement was refused outright.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacementRejection {
    OutOfBounds,
    Occupied,
}

impl fmt::Display for PlacementRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementRejection::OutOfBounds => f.write_str("out of bounds"),
            PlacementRejection::Occupied => f.write_str("occupied"),
        }
    }
}

/// Result of one tentative placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacementOutcome {
    /// Placed and kept.
    Accepted(CellId),
    /// Placed, then removed because some cell lost reachability.
    RolledBack,
    /// Never placed.
    Rejected(PlacementRejection),
}

/// Summary of one `create_cells_around_current()` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerationReport {
    pub target: usize,
    pub placed: usize,
    pub rolled_back: usize,
    pub attempts: u32,
}

impl GenerationReport {
    pub fn reached_target(&self, cell_count: usize) -> bool {
        cell_count >= self.target
    }
}

impl Grid {
    /// Target cell count for the current level.
    pub fn level_target(&self) -> usize {
        self.config.level_target(self.level)
    }

    /// Sorted, deduplicated candidate positions for the next placement.
    pub fn placement_candidates(&self) -> Vec<GridPosition> {
        let height = self.occupancy.height();
        let mut out = Vec::new();

        for cell in self.cells.values() {
            for p in Perspective::ALL {
                if self.config.skip_active_perspective && p == self.perspective {
                    continue;
                }
                for d in PlaneDirection::CARDINALS {
                    let step = d.step(cell.position());
                    if self.projected.contains_position(p, step) {
                        continue;
                    }
                    for candidate in all_shifts_to_height(step, p, 0, height) {
                        if self.config.skip_direct_neighbors && candidate == step {
                            continue;
                        }
                        if self.occupancy.in_bounds(candidate)
                            && !self.occupancy.is_occupied(candidate)
                            && !self.is_prohibited(candidate)
                        {
                            out.push(candidate);
                        }
                    }
                }
            }
        }

        out.sort();
        out.dedup();
        out
    }

    /// Place a cell at `position` and keep it only if every cell still
    /// reaches, and is reached from, the current cell.
    pub fn try_place_cell(&mut self, position: GridPosition) -> PlacementOutcome {
        let id = match self.insert_cell(position) {
            Ok(id) => id,
            Err(reason) => {
                trace!("placement at {position} rejected: {reason}");
                return PlacementOutcome::Rejected(reason);
            }
        };

        if self.every_cell_linked_to_current() {
            self.prohibit_around(id);
            PlacementOutcome::Accepted(id)
        } else {
            trace!("placement at {position} rolled back: reachability lost");
            self.remove_cell(id);
            PlacementOutcome::RolledBack
        }
    }

    /// Whether every cell and the current cell reach each other through
    /// the inter-perspective matrix.
    pub fn every_cell_linked_to_current(&self) -> bool {
        let Some(anchor) = self.dense_index(self.current) else {
            return false;
        };
        let m = &self.inter_perspective;
        let home = self.inter_perspective_node(self.perspective, anchor);
        (0..self.order.len()).all(|i| {
            let node = self.inter_perspective_node(self.perspective, i);
            m.is_reachable(node, home) && m.is_reachable(home, node)
        })
    }

    /// Mark the positions above both endpoints of every connection touching
    /// `id` as prohibited in all four planes, whichever perspective the
    /// connection exists under.
    fn prohibit_around(&mut self, id: CellId) {
        let top = self.occupancy.height();
        let mut seams: BTreeSet<(GridPosition, GridPosition)> = BTreeSet::new();

        for p in Perspective::ALL {
            for cell in self.cells.values() {
                for (_, neighbor) in cell.connections(p).iter() {
                    if cell.id() != id && neighbor != id {
                        continue;
                    }
                    if let Some(other) = self.cells.get(&neighbor) {
                        seams.insert((cell.position(), other.position()));
                    }
                }
            }
        }

        for (a, b) in seams {
            let lower = a.y.min(b.y);
            for end in [a, b] {
                for h in lower + 1..top {
                    let above = GridPosition::new(end.x, h, end.z);
                    for q in Perspective::ALL {
                        self.prohibited.insert_position(q, above);
                    }
                }
            }
        }
    }

    /// Grow the level toward `level_target()`.
    pub fn create_cells_around_current(&mut self) -> GenerationReport {
        let target = self.level_target();
        let budget = self.config.placement_retry_budget;
        let mut report = GenerationReport {
            target,
            placed: 0,
            rolled_back: 0,
            attempts: 0,
        };
        // Positions that failed since the last accepted placement.
        let mut failed: BTreeSet<GridPosition> = BTreeSet::new();

        while self.cells.len() < target && report.attempts < budget {
            let candidates: Vec<GridPosition> = self
                .placement_candidates()
                .into_iter()
                .filter(|c| !failed.contains(c))
                .collect();
            let Some(&position) = self.rng.choose(&candidates) else {
                break;
            };
            report.attempts += 1;

            match self.try_place_cell(position) {
                PlacementOutcome::Accepted(_) => {
                    report.placed += 1;
                    failed.clear();
                }
                PlacementOutcome::RolledBack => {
                    report.rolled_back += 1;
                    failed.insert(position);
                }
                PlacementOutcome::Rejected(_) => {
                    failed.insert(position);
                }
            }
        }

        if !report.reached_target(self.cells.len()) {
            warn!(
                "level {}: generation stopped at {}/{} cells after {} attempts",
                self.level,
                self.cells.len(),
                target,
                report.attempts,
            );
        }
        report
    }

    /// Clear every cell but the current one and regenerate with the next
    /// level's target.
    pub fn advance_level(&mut self) -> Vec<GridEvent> {
        let keep = self.current;
        self.cells.retain(|&id, _| id == keep);
        self.prohibited.clear();
        self.level += 1;
        self.rebuild_derived_state();

        let report = self.create_cells_around_current();
        let cell_count = self.cells.len();
        info!(
            "advanced to level {}: {cell_count}/{} cells",
            self.level, report.target,
        );

        let mut events = vec![GridEvent::LevelAdvanced {
            level: self.level,
            cell_count,
            target: report.target,
        }];
        if !report.reached_target(cell_count) {
            events.push(GridEvent::GenerationShortfall {
                placed: cell_count,
                target: report.target,
            });
        }
        events.extend(self.refresh_cell_states());
        events
    }
}
