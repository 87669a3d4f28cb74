// Grid serialization.
//
// A `GridSnapshot` holds only the authoritative state: config, RNG state,
// level, perspective, current cell, id counter, one record per cell, and the
// prohibited-projection planes (which accumulate and cannot be recomputed).
// Occupancy, the projection index, connection tables, path matrices and
// published cell states are transient and rebuilt on load by
// `Grid::rebuild_derived_state()`.
//
// Restoring the RNG state means a loaded grid generates its next level
// exactly as the original would have.
//
// See also: `grid.rs` for the derived state, `config.rs` for validation.

use crate::cell::Cell;
use crate::config::{ConfigError, GridConfig};
use crate::geometry::Perspective;
use crate::grid::Grid;
use crate::occupancy::{Occupancy, ProjectionPlanes};
use crate::pathfinding::PathMatrices;
use crate::types::{CellId, GridPosition};
use isoweave_prng::PuzzleRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid snapshot json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid snapshot config: {0}")]
    Config(#[from] ConfigError),
    #[error("{cell} at {position} lies outside the grid")]
    CellOutOfBounds { cell: CellId, position: GridPosition },
    #[error("{cell} shares position {position} with another cell")]
    DuplicatePosition { cell: CellId, position: GridPosition },
    #[error("{cell} appears more than once")]
    DuplicateId { cell: CellId },
    #[error("{cell} is not below the id counter {next_cell_id}")]
    IdBeyondCounter { cell: CellId, next_cell_id: u32 },
    #[error("current cell {cell} is missing")]
    MissingCurrent { cell: CellId },
    #[error("prohibited planes do not match the grid size")]
    PlaneShapeMismatch,
}

/// Persisted state of one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRecord {
    pub id: CellId,
    pub position: GridPosition,
    pub planted: bool,
}

/// Everything needed to rebuild a `Grid`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub config: GridConfig,
    pub rng: PuzzleRng,
    pub level: u32,
    pub perspective: Perspective,
    pub current: CellId,
    pub next_cell_id: u32,
    pub cells: Vec<CellRecord>,
    pub prohibited: ProjectionPlanes,
}

impl Grid {
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            config: self.config.clone(),
            rng: self.rng.clone(),
            level: self.level,
            perspective: self.perspective,
            current: self.current,
            next_cell_id: self.next_cell_id,
            cells: self
                .cells
                .values()
                .map(|c| CellRecord {
                    id: c.id(),
                    position: c.position(),
                    planted: c.is_planted(),
                })
                .collect(),
            prohibited: self.prohibited.clone(),
        }
    }

    /// Validate a snapshot and rebuild all derived state from it.
    pub fn from_snapshot(snapshot: GridSnapshot) -> Result<Self, SnapshotError> {
        snapshot.config.validate()?;
        let (sx, sy, sz) = snapshot.config.grid_size;
        if !snapshot.prohibited.fits_grid(sx, sy, sz) {
            return Err(SnapshotError::PlaneShapeMismatch);
        }

        let mut cells = BTreeMap::new();
        let mut positions = BTreeSet::new();
        for record in &snapshot.cells {
            let (cell, position) = (record.id, record.position);
            if !snapshot.config.contains(position) {
                return Err(SnapshotError::CellOutOfBounds { cell, position });
            }
            if !positions.insert(position) {
                return Err(SnapshotError::DuplicatePosition { cell, position });
            }
            if cell.0 >= snapshot.next_cell_id {
                return Err(SnapshotError::IdBeyondCounter {
                    cell,
                    next_cell_id: snapshot.next_cell_id,
                });
            }
            let mut restored = Cell::new(cell, position);
            if record.planted {
                restored.plant();
            }
            if cells.insert(cell, restored).is_some() {
                return Err(SnapshotError::DuplicateId { cell });
            }
        }
        if !cells.contains_key(&snapshot.current) {
            return Err(SnapshotError::MissingCurrent {
                cell: snapshot.current,
            });
        }

        let mut grid = Grid {
            rng: snapshot.rng,
            level: snapshot.level,
            perspective: snapshot.perspective,
            current: snapshot.current,
            next_cell_id: snapshot.next_cell_id,
            cells,
            prohibited: snapshot.prohibited,
            occupancy: Occupancy::new(sx, sy, sz),
            projected: ProjectionPlanes::for_grid(sx, sy, sz),
            order: Vec::new(),
            matrices: Default::default(),
            inter_perspective: PathMatrices::default(),
            published: BTreeMap::new(),
            config: snapshot.config,
        };
        grid.rebuild_derived_state();
        grid.published = grid.compute_cell_states();
        Ok(grid)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.snapshot())
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: GridSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellState;

    fn generated() -> Grid {
        Grid::generate(GridConfig::default(), 11).unwrap()
    }

    #[test]
    fn json_roundtrip_preserves_state() {
        let grid = generated();
        let restored = Grid::from_json(&grid.to_json().unwrap()).unwrap();

        assert_eq!(grid.snapshot(), restored.snapshot());
        assert_eq!(grid.cell_states(), restored.cell_states());
        for p in Perspective::ALL {
            assert_eq!(grid.path_matrices(p), restored.path_matrices(p));
            for cell in grid.cells() {
                assert_eq!(
                    cell.connections(p),
                    restored.cell(cell.id()).unwrap().connections(p),
                    "{p} {}",
                    cell.id()
                );
            }
        }
        assert_eq!(
            grid.inter_perspective_matrices(),
            restored.inter_perspective_matrices()
        );
    }

    #[test]
    fn restored_grid_generates_the_same_next_level() {
        let mut original = generated();
        let mut restored = Grid::from_json(&original.to_json().unwrap()).unwrap();
        original.advance_level();
        restored.advance_level();
        assert_eq!(original.snapshot(), restored.snapshot());
    }

    #[test]
    fn restore_rejects_out_of_bounds_cells() {
        let mut snapshot = generated().snapshot();
        snapshot.cells[0].position = GridPosition::new(0, 20, 0);
        assert!(matches!(
            Grid::from_snapshot(snapshot),
            Err(SnapshotError::CellOutOfBounds { .. })
        ));
    }

    #[test]
    fn restore_rejects_shared_positions() {
        let mut snapshot = Grid::new(GridConfig::default(), 0).unwrap().snapshot();
        let twin = CellRecord {
            id: CellId(1),
            ..snapshot.cells[0]
        };
        snapshot.cells.push(twin);
        snapshot.next_cell_id = 2;
        assert!(matches!(
            Grid::from_snapshot(snapshot),
            Err(SnapshotError::DuplicatePosition { .. })
        ));
    }

    #[test]
    fn restore_rejects_missing_current() {
        let mut snapshot = Grid::new(GridConfig::default(), 0).unwrap().snapshot();
        snapshot.current = CellId(5);
        assert!(matches!(
            Grid::from_snapshot(snapshot),
            Err(SnapshotError::MissingCurrent { cell: CellId(5) })
        ));
    }

    #[test]
    fn restore_rejects_ids_past_the_counter() {
        let mut snapshot = Grid::new(GridConfig::default(), 0).unwrap().snapshot();
        snapshot.next_cell_id = 0;
        assert!(matches!(
            Grid::from_snapshot(snapshot),
            Err(SnapshotError::IdBeyondCounter { .. })
        ));
    }

    #[test]
    fn restore_rejects_mismatched_planes() {
        let mut snapshot = Grid::new(GridConfig::default(), 0).unwrap().snapshot();
        snapshot.prohibited = ProjectionPlanes::for_grid(3, 3, 3);
        assert!(matches!(
            Grid::from_snapshot(snapshot),
            Err(SnapshotError::PlaneShapeMismatch)
        ));
    }

    #[test]
    fn restored_seed_is_current() {
        let json = Grid::new(GridConfig::default(), 0).unwrap().to_json().unwrap();
        let grid = Grid::from_json(&json).unwrap();
        assert_eq!(grid.cell_state(grid.current_cell()), Some(CellState::Current));
    }
}
