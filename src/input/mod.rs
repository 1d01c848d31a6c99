//! Input routing: cursor grab state machine, keybindings, pointer
//! constraints (SPEC_FULL.md §4.4).

pub mod keybinding;
pub mod pointer_constraint;
pub mod router;

pub use router::InputRouter;
