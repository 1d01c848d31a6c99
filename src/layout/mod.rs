//! Tiling layout engines (SPEC_FULL.md §4.3).
//!
//! Three layout kinds share one job: given a workspace's set of visible,
//! tileable containers and an output's usable area, decide each container's
//! rectangle. `floating` does almost nothing; `master` generalizes
//! `aigi_first/src/state.rs::new_toplevel`'s equal-row math into a strategy
//! registry; `bsp` replaces `aigi/src/tiling.rs::TilingState` with an
//! arena-based binary space partition.

pub mod bsp;
pub mod floating;
pub mod master;

pub use bsp::BspTree;
