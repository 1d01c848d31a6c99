//! Command-line surface (SPEC_FULL.md §6, §10.2).
//!
//! The teacher hardcodes every setting (`aigi/src/main.rs` creates its
//! output, seat, and sockets with no configurability at all); this is the
//! one piece of the ambient stack that has no teacher precedent and is
//! instead built straight from the spec's CLI section.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "cwc", version, about = "A dynamic, tiling-capable Wayland compositor")]
pub struct Cli {
    /// Path to a RON config file. Defaults to a built-in configuration.
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Command to run once the compositor is ready to accept clients.
    #[arg(short = 's', long = "startup", value_name = "CMD")]
    pub startup: Option<String>,

    /// Additional directories to search for loadable modules, `;`-separated.
    /// May be passed more than once; entries accumulate in order.
    #[arg(short = 'l', long = "library", value_name = "DIR[;DIR]*")]
    pub library: Vec<String>,

    /// Increase log verbosity. Repeatable, clamped to 3.
    #[arg(short = 'd', long = "debug", action = clap::ArgAction::Count)]
    pub debug: u8,
}

impl Cli {
    /// Parses `std::env::args`, exiting the process with code 1 on a parse
    /// error (clap's default `error().exit()` behavior satisfies §6 exactly).
    pub fn parse_args() -> Self {
        let mut cli = Cli::parse();
        cli.debug = cli.debug.min(3);
        cli
    }

    /// The flattened, order-preserving list of library search directories,
    /// splitting each `-l` occurrence on `;` as the spec requires.
    pub fn library_dirs(&self) -> Vec<String> {
        self.library
            .iter()
            .flat_map(|entry| entry.split(';'))
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_clamps_to_three() {
        let mut cli = Cli::parse_from(["cwc", "-dddddd"]);
        cli.debug = cli.debug.min(3);
        assert_eq!(cli.debug, 3);
    }

    #[test]
    fn library_dirs_splits_on_semicolon_and_preserves_order() {
        let cli = Cli::parse_from(["cwc", "-l", "/a;/b", "-l", "/c"]);
        assert_eq!(cli.library_dirs(), vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn config_and_startup_default_to_none() {
        let cli = Cli::parse_from(["cwc"]);
        assert!(cli.config.is_none());
        assert!(cli.startup.is_none());
    }
}
