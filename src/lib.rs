//! `cwc`: a dynamic, tiling-capable Wayland compositor core.
//!
//! This crate is split into a pure, unit-tested domain model (`container`,
//! `output`, `tag`, `layout`, `input::router`, `scene`, `signal`, `border`,
//! `layer_shell`, `session_lock`) and a thin protocol-glue layer (`app`) that
//! binds that model to Smithay's wire-protocol state machines. Everything in
//! the former is written and tested against plain geometry and the
//! `SceneBackend`/`Tileable` seams, never against a live Wayland socket.

pub mod app;
pub mod border;
pub mod cli;
pub mod config;
pub mod container;
pub mod cursor;
pub mod error;
pub mod ids;
pub mod input;
pub mod layer_shell;
pub mod layout;
pub mod logging;
pub mod output;
pub mod scene;
pub mod session_lock;
pub mod signal;
pub mod tag;
pub mod toplevel;

pub use app::AppState;
