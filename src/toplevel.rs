//! Toplevel surfaces and their lifecycle (SPEC_FULL.md §3, §4.8).
//!
//! Grounded on `aigi_udev/src/state.rs`'s `XdgShellHandler::new_toplevel` /
//! `toplevel_destroyed`, which only ever handled one surface kind. The
//! untagged-union note in REDESIGN FLAGS §11 asks for a proper tagged enum
//! once a legacy-X11 counterpart exists, so `ToplevelKind` carries both
//! cases explicitly instead of matching on an `Option<X11Surface>` beside a
//! `ToplevelSurface` field.

use smithay::desktop::space::SpaceElement as _;
use smithay::wayland::shell::xdg::ToplevelSurface;

use crate::ids::ContainerId;

/// Which wire protocol produced this toplevel. `Legacy` is XWayland; there
/// is exactly one handle set per kind, never both (REDESIGN FLAGS §11).
pub enum ToplevelKind {
    Native(ToplevelSurface),
    Legacy(LegacySurface),
}

/// Placeholder for an XWayland surface handle. This crate's non-goal list
/// excludes XWayland integration itself, but the data model's tagged union
/// is still worth expressing so a later XWayland backend slots in without
/// another REDESIGN pass.
pub struct LegacySurface {
    pub is_modal: bool,
    pub has_parent: bool,
    pub min_size: Option<(i32, i32)>,
    pub max_size: Option<(i32, i32)>,
}

pub struct Toplevel {
    pub kind: ToplevelKind,
    container: Option<ContainerId>,
    mapped: bool,
}

impl Toplevel {
    pub fn new_native(surface: ToplevelSurface) -> Self {
        Self {
            kind: ToplevelKind::Native(surface),
            container: None,
            mapped: false,
        }
    }

    pub fn new_legacy(surface: LegacySurface) -> Self {
        Self {
            kind: ToplevelKind::Legacy(surface),
            container: None,
            mapped: false,
        }
    }

    pub fn container(&self) -> Option<ContainerId> {
        self.container
    }

    pub fn set_container(&mut self, container: Option<ContainerId>) {
        self.container = container;
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    pub fn set_mapped(&mut self, mapped: bool) {
        self.mapped = mapped;
    }

    fn has_parent(&self) -> bool {
        match &self.kind {
            ToplevelKind::Native(surface) => surface.parent().is_some(),
            ToplevelKind::Legacy(legacy) => legacy.has_parent,
        }
    }

    fn min_equals_max(&self) -> bool {
        match &self.kind {
            ToplevelKind::Native(surface) => {
                let (min, max) = surface.with_pending_state(|state| (state.min_size, state.max_size));
                match (min, max) {
                    (Some(min), Some(max)) => {
                        (min.w != 0 && min.w == max.w) || (min.h != 0 && min.h == max.h)
                    }
                    _ => false,
                }
            }
            ToplevelKind::Legacy(legacy) => match (legacy.min_size, legacy.max_size) {
                (Some(min), Some(max)) => {
                    (min.0 != 0 && min.0 == max.0) || (min.1 != 0 && min.1 == max.1)
                }
                _ => false,
            },
        }
    }

    fn is_legacy_modal(&self) -> bool {
        matches!(&self.kind, ToplevelKind::Legacy(legacy) if legacy.is_modal)
    }

    /// True iff the toplevel has a parent, its min size equals its max size
    /// in either dimension, or (legacy-X11) it is a modal dialog (§4.8 step 3).
    pub fn should_float(&self) -> bool {
        self.has_parent() || self.min_equals_max() || self.is_legacy_modal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy(has_parent: bool, is_modal: bool, min: Option<(i32, i32)>, max: Option<(i32, i32)>) -> Toplevel {
        Toplevel::new_legacy(LegacySurface {
            is_modal,
            has_parent,
            min_size: min,
            max_size: max,
        })
    }

    #[test]
    fn legacy_modal_should_float() {
        let t = legacy(false, true, None, None);
        assert!(t.should_float());
    }

    #[test]
    fn legacy_with_parent_should_float() {
        let t = legacy(true, false, None, None);
        assert!(t.should_float());
    }

    #[test]
    fn legacy_fixed_size_should_float() {
        let t = legacy(false, false, Some((400, 300)), Some((400, 300)));
        assert!(t.should_float());
    }

    #[test]
    fn legacy_resizable_plain_toplevel_obeys_layout() {
        let t = legacy(false, false, None, None);
        assert!(!t.should_float());
    }

    #[test]
    fn unmapped_toplevel_starts_without_a_container() {
        let t = legacy(false, false, None, None);
        assert!(!t.is_mapped());
        assert_eq!(t.container(), None);
    }
}
