// Full route reconstruction on top of the grid's successor matrices.
//
// `plan_route()` walks the active perspective's matrix into a cell list for
// player movement. `plan_inter_perspective_route()` walks the
// inter-perspective matrix into movement waypoints for actors that may
// rotate the camera on the way: a rotation step is folded into the
// perspective carried by the following move, so every waypoint is an
// actual step to a neighbour.
//
// Every walk is bounded by the matrix size, so a corrupted table returns
// `None` instead of looping.
//
// See also: `grid.rs` for the single-step successor queries these loop over.

use crate::geometry::{Perspective, PlaneDirection};
use crate::grid::Grid;
use crate::types::CellId;
use serde::{Deserialize, Serialize};

/// One move along an inter-perspective route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterPerspectiveWaypoint {
    /// Cell this step arrives at.
    pub cell: CellId,
    /// Perspective the step is taken under.
    pub perspective: Perspective,
    /// Direction label of the move, `None` for an in-place rotation.
    pub direction: Option<PlaneDirection>,
}

impl Grid {
    /// Cells from the current cell to `goal` under the active perspective,
    /// excluding the start and including the goal. `Some(vec![])` when
    /// already there.
    pub fn plan_route(&self, goal: CellId) -> Option<Vec<CellId>> {
        self.plan_route_in(self.perspective, self.current, goal)
    }

    pub fn plan_route_in(
        &self,
        perspective: Perspective,
        start: CellId,
        goal: CellId,
    ) -> Option<Vec<CellId>> {
        let s = self.dense_index(start)?;
        let g = self.dense_index(goal)?;
        let nodes = self.path_matrices(perspective).path(s, g)?;
        nodes
            .into_iter()
            .skip(1)
            .map(|i| self.cell_at_index(i))
            .collect()
    }

    /// Movement waypoints from `start` under `perspective` to `goal`.
    pub fn plan_inter_perspective_route(
        &self,
        start: CellId,
        perspective: Perspective,
        goal: CellId,
    ) -> Option<Vec<InterPerspectiveWaypoint>> {
        self.dense_index(start)?;
        self.dense_index(goal)?;

        let limit = self.inter_perspective_matrices().len();
        let mut waypoints = Vec::new();
        let (mut at, mut facing) = (start, perspective);
        let mut steps = 0;

        while at != goal {
            if steps > limit {
                return None;
            }
            steps += 1;
            let step = self.successor_on_path_inter_perspective(facing, at, goal)?;
            facing = step.perspective;
            if step.cell != at {
                at = step.cell;
                waypoints.push(step);
            }
        }
        Some(waypoints)
    }

    /// Direction under which the current cell connects to `cell` in the
    /// active perspective.
    pub fn direction_to_current(&self, cell: CellId) -> Option<PlaneDirection> {
        self.cells
            .get(&self.current)?
            .direction_to(self.perspective, cell)
    }
}
