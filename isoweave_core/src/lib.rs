// isoweave_core: the logic of an isometric rotate-the-camera puzzle.
//
// A voxel grid is viewed from one of four fixed camera perspectives. Two
// cells are connected only when their screen projections line up under the
// active perspective and nothing occludes the seam, so rotating the camera
// changes the walkable graph. This crate holds everything with algorithmic
// weight; rendering, input, camera easing and actor interpolation live in
// collaborators that read the state exposed here.
//
// Module overview:
// - `types.rs`:       GridPosition, ScreenProjection, CellId, CellState.
// - `geometry.rs`:    Perspective / PlaneDirection tables, projection, height shifts,
//                     occlusion table.
// - `occupancy.rs`:   Dense 3D occupancy index and per-perspective projection flag planes.
// - `cell.rs`:        Cell + per-perspective connection tables and the blocking rules.
// - `pathfinding.rs`: All-pairs successor/cost matrices (Floyd-Warshall).
// - `grid.rs`:        Grid: cell ownership, index rebuilds, path matrices, gameplay queries.
// - `generation.rs`:  Procedural placement with rollback on lost reachability, level advance.
// - `route.rs`:       Full path reconstruction into cells or inter-perspective waypoints.
// - `snapshot.rs`:    GridSnapshot JSON save/restore with derived-state rebuild.
// - `event.rs`:       GridEvent, returned by every state-changing call.
// - `config.rs`:      GridConfig, loaded from JSON, validated.
// - `ascii.rs`:       Text rendering of one perspective's projection plane.
// - `prng`:           Re-exported from `isoweave_prng`.
//
// **Critical constraint: determinism.** Levels are a pure function of
// `(GridConfig, seed)`. No `HashMap`, no system time, no OS entropy. Ordered
// storage is `BTreeMap`; hot lookups are dense `Vec`s.

pub mod ascii;
pub mod cell;
pub mod config;
pub mod event;
pub mod generation;
pub mod geometry;
pub mod grid;
pub mod occupancy;
pub mod pathfinding;
pub mod route;
pub mod snapshot;
pub mod types;

pub use isoweave_prng as prng;
