//! Structured logging bootstrap (SPEC_FULL.md §10.4).
//!
//! Replaces the teacher's scattered `println!` calls with `tracing`, the
//! crate modern smithay compositors use in place of the older `slog`
//! plumbing `xdg-shell-wrapper` still carries.

use tracing_subscriber::EnvFilter;

/// Maps the repeatable `-d/--debug` CLI flag (clamped to 3 by [`crate::cli`])
/// onto a verbosity level, matching §6's "exit codes" style of small, fixed
/// enumerations.
pub fn verbosity_to_level(debug_count: u8) -> tracing::Level {
    match debug_count {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

/// Installs the global subscriber. Safe to call once per process; a second
/// call is a programmer error, but we tolerate it (init returns `Err` which
/// we ignore) rather than panicking the compositor over a logging mistake.
pub fn init(debug_count: u8) {
    let level = verbosity_to_level(debug_count);
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_debug_counts_map_to_increasing_verbosity() {
        assert_eq!(verbosity_to_level(0), tracing::Level::WARN);
        assert_eq!(verbosity_to_level(1), tracing::Level::INFO);
        assert_eq!(verbosity_to_level(2), tracing::Level::DEBUG);
        assert_eq!(verbosity_to_level(3), tracing::Level::TRACE);
        // anything beyond the CLI's clamp still resolves, it just saturates
        assert_eq!(verbosity_to_level(9), tracing::Level::TRACE);
    }
}
