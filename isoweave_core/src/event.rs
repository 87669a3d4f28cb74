// Events emitted by grid mutations.
//
// Every mutating call on `Grid` (`set_perspective`, `set_current_cell`,
// `advance_level`) returns the events it caused, in the order they
// happened. A presentation layer drains them to update camera, materials,
// score and so on; the engine itself never calls out.
//
// See also: `grid.rs` which produces these, `types.rs` for `CellState`.
//
// **Critical constraint: determinism.** Event order is a pure function of
// grid state and the call sequence.

use crate::geometry::Perspective;
use crate::types::{CellId, CellState};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Something that changed as a result of a grid mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridEvent {
    /// The active perspective changed.
    PerspectiveChanged { from: Perspective, to: Perspective },
    /// A cell was visited for the first time.
    CellPlanted { cell: CellId },
    /// The player moved onto another cell.
    CurrentCellChanged { from: CellId, to: CellId },
    /// Every cell was planted; the grid was cleared around the current cell
    /// and regenerated.
    LevelAdvanced {
        level: u32,
        cell_count: usize,
        target: usize,
    },
    /// Generation stopped short of its target (budget or candidates ran out).
    GenerationShortfall { placed: usize, target: usize },
    /// A cell's presentation state changed. `from` is `None` for cells that
    /// did not exist at the previous publish.
    CellStateChanged {
        cell: CellId,
        from: Option<CellState>,
        to: CellState,
    },
}

impl fmt::Display for GridEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridEvent::PerspectiveChanged { from, to } => {
                write!(f, "perspective {from} -> {to}")
            }
            GridEvent::CellPlanted { cell } => write!(f, "planted {cell}"),
            GridEvent::CurrentCellChanged { from, to } => write!(f, "moved {from} -> {to}"),
            GridEvent::LevelAdvanced {
                level,
                cell_count,
                target,
            } => write!(f, "level {level}: {cell_count}/{target} cells"),
            GridEvent::GenerationShortfall { placed, target } => {
                write!(f, "generation short: {placed}/{target} cells")
            }
            GridEvent::CellStateChanged { cell, from, to } => match from {
                Some(from) => write!(f, "{cell} {from:?} -> {to:?}"),
                None => write!(f, "{cell} -> {to:?}"),
            },
        }
    }
}
