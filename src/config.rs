//! On-disk configuration (SPEC_FULL.md §10.5).
//!
//! The teacher carries no config layer at all — `aigi_udev/src/state.rs`
//! hardcodes a border-less, single-seat compositor. The format (RON via
//! `serde`) is borrowed from `cosmic-panel-config`, the one crate in the
//! retrieval pack that actually persists a Wayland-shell-adjacent
//! configuration to disk.
//!
//! Persisting configuration *back* to disk is an explicit Non-goal (§1); this
//! module only ever reads.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::tag::LayoutKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorderConfig {
    pub thickness: u32,
    pub focused_rgba: [f32; 4],
    pub unfocused_rgba: [f32; 4],
}

impl Default for BorderConfig {
    fn default() -> Self {
        Self {
            thickness: 2,
            focused_rgba: [0.35, 0.55, 0.95, 1.0],
            unfocused_rgba: [0.2, 0.2, 0.2, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorConfig {
    pub theme: String,
    pub size: u32,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            theme: "default".to_owned(),
            size: 24,
        }
    }
}

/// A single entry of the keybinding table (SPEC_FULL.md §4.4). `mods` is a
/// list of modifier names (`"ctrl"`, `"alt"`, `"shift"`, `"super"`); `key` is
/// either a keysym name (`"Return"`) or a pointer button name (`"btn_left"`).
/// `action` is an opaque command string handed to the scripting host /
/// startup-command runner — the core only needs the chord, not the meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeybindEntry {
    pub mods: Vec<String>,
    pub key: String,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub gap: u32,
    pub default_layout: LayoutKind,
    pub mwfact: f64,
    pub border: BorderConfig,
    pub cursor: CursorConfig,
    pub keybinds: Vec<KeybindEntry>,
    pub startup_commands: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gap: 8,
            default_layout: LayoutKind::Master,
            mwfact: 0.5,
            border: BorderConfig::default(),
            cursor: CursorConfig::default(),
            keybinds: Vec::new(),
            startup_commands: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(ConfigError::Parse)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    /// Loads from `path` if given, otherwise returns the built-in default —
    /// the fallback the spec's `-c` flag description implies.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_valid_mwfact() {
        let cfg = Config::default();
        assert!(cfg.mwfact >= 0.1 && cfg.mwfact <= 0.9);
    }

    #[test]
    fn round_trips_through_ron() {
        let cfg = Config::default();
        let text = ron::to_string(&cfg).unwrap();
        let parsed = Config::from_ron_str(&text).unwrap();
        assert_eq!(cfg, parsed);
    }

    #[test]
    fn missing_path_falls_back_to_default() {
        let cfg = Config::load_or_default(None).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn malformed_ron_is_a_parse_error() {
        let err = Config::from_ron_str("not valid ron (((").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
