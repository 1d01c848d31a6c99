//! Per-subsystem error taxonomy (SPEC_FULL.md §7).
//!
//! Each enum below is a direct Rust expression of one bullet of the error
//! taxonomy: the variant names are the semantic kinds the spec lists, not
//! ad hoc strings. Callers compose these with `anyhow` at the edges (CLI,
//! config loading, `main`), matching the teacher's own use of
//! `anyhow::Result` in `aigi_udev/src/state.rs::AIGIState::init`.

use thiserror::Error;

use crate::ids::ContainerId;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("container {0:?} is unmanaged and cannot be arranged")]
    Unmanaged(ContainerId),
    #[error("toplevel does not belong to container {0:?}")]
    ToplevelNotFound(ContainerId),
    #[error("cannot toggle fullscreen and maximized at once on container {0:?}")]
    ExclusiveStateConflict(ContainerId),
}

#[derive(Debug, Error)]
pub enum BspError {
    #[error("BSP tree for this workspace is empty")]
    EmptyTree,
    #[error("container is not present in the BSP tree")]
    NotInTree,
    #[error("attempted to toggle_split on an internal node, not a leaf")]
    NotALeaf,
    #[error("leaf is the tree root and has no parent internal node to toggle")]
    NoParentToSplit,
}

#[derive(Debug, Error)]
pub enum TagError {
    #[error("workspace index {0} out of range [1, {1}]")]
    WorkspaceOutOfRange(u8, u8),
    #[error("tag bit position {0} out of range [0, 30)")]
    TagOutOfRange(u8),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("output {0:?} no longer exists (hot-unplug race)")]
    Gone(crate::ids::OutputId),
    #[error("no output is currently available")]
    NoOutput,
}

/// Programmer invariant violation (SPEC_FULL.md §7: asserted in debug builds,
/// logged and tolerated in release). Call sites use [`invariant!`] rather than
/// constructing this directly.
#[derive(Debug, Error)]
#[error("invariant violated: {0}")]
pub struct InvariantViolation(pub &'static str);

/// Debug-assert the condition; in release builds, log the violation at
/// `error` level and continue rather than aborting the compositor, matching
/// the "programmer invariant violation" recovery policy in §7.
#[macro_export]
macro_rules! invariant {
    ($cond:expr, $msg:literal) => {
        if !$cond {
            debug_assert!($cond, $msg);
            tracing::error!(invariant = $msg, "invariant violation tolerated in release");
        }
    };
}
