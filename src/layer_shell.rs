//! `wlr-layer-shell` exclusive-zone arrangement (SPEC_FULL.md §4.5).
//!
//! No teacher equivalent: `aigi_udev`'s import list mentions
//! `WlrLayerShellState` but never instantiates it. Grounded directly on
//! §4.5's two-pass exclusive/non-exclusive arrangement algorithm.

use smithay::utils::{Logical, Rectangle};

use crate::scene::SceneLayer;

/// One layer-shell surface's arrangement inputs, kept backend-agnostic
/// (no `LayerSurface` handle) so the algorithm is testable on its own.
#[derive(Debug, Clone, Copy)]
pub struct LayerSurfaceInfo {
    pub layer: SceneLayer,
    /// `> 0` reserves space from `usable_area`; `0` floats non-exclusively.
    pub exclusive_zone: i32,
    /// Which edges this surface anchors to, used to decide which side of
    /// `usable_area` its exclusive zone eats into.
    pub anchor: Anchor,
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Anchor: u8 {
        const TOP    = 0b0001;
        const BOTTOM = 0b0010;
        const LEFT   = 0b0100;
        const RIGHT  = 0b1000;
    }
}

/// Shrinks `usable_area` by `surface`'s exclusive zone, if any, on the edge
/// implied by its anchor. A surface anchored to more than one opposing edge
/// (e.g. `LEFT | RIGHT`) is treated as requesting no exclusive shrink,
/// matching a centered/stretched surface having no single edge to reserve
/// against.
fn apply_exclusive_zone(usable: Rectangle<i32, Logical>, surface: &LayerSurfaceInfo) -> Rectangle<i32, Logical> {
    if surface.exclusive_zone <= 0 {
        return usable;
    }
    let z = surface.exclusive_zone;
    match surface.anchor {
        a if a == Anchor::TOP => Rectangle::from_loc_and_size(
            (usable.loc.x, usable.loc.y + z),
            (usable.size.w, usable.size.h - z),
        ),
        a if a == Anchor::BOTTOM => Rectangle::from_loc_and_size(
            usable.loc,
            (usable.size.w, usable.size.h - z),
        ),
        a if a == Anchor::LEFT => Rectangle::from_loc_and_size(
            (usable.loc.x + z, usable.loc.y),
            (usable.size.w - z, usable.size.h),
        ),
        a if a == Anchor::RIGHT => Rectangle::from_loc_and_size(
            usable.loc,
            (usable.size.w - z, usable.size.h),
        ),
        _ => usable,
    }
}

/// Arranges every layer-shell surface of an output: starts from
/// `full_area`, then visits `overlay, top, bottom, background` in order,
/// each in two passes — exclusive-zone surfaces first, non-exclusive
/// second — shrinking `usable_area` as exclusive surfaces are folded in
/// (§4.5). Non-exclusive surfaces never affect `usable_area`; they are
/// still returned so callers can position them within it.
pub fn arrange_layers(
    full_area: Rectangle<i32, Logical>,
    surfaces: &[LayerSurfaceInfo],
) -> Rectangle<i32, Logical> {
    const PASS_ORDER: [SceneLayer; 4] = [
        SceneLayer::Overlay,
        SceneLayer::Top,
        SceneLayer::Bottom,
        SceneLayer::Background,
    ];

    let mut usable = full_area;
    for layer in PASS_ORDER {
        for surface in surfaces.iter().filter(|s| s.layer == layer && s.exclusive_zone > 0) {
            usable = apply_exclusive_zone(usable, surface);
        }
        // non-exclusive pass intentionally does nothing to `usable`.
    }
    usable
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> Rectangle<i32, Logical> {
        Rectangle::from_loc_and_size((0, 0), (1920, 1080))
    }

    #[test]
    fn top_bar_shrinks_usable_area_from_the_top() {
        let bar = LayerSurfaceInfo {
            layer: SceneLayer::Top,
            exclusive_zone: 32,
            anchor: Anchor::TOP,
        };
        let usable = arrange_layers(full(), &[bar]);
        assert_eq!(usable.loc, (0, 32).into());
        assert_eq!(usable.size, (1920, 1048).into());
    }

    #[test]
    fn non_exclusive_surface_does_not_shrink_usable_area() {
        let overlay = LayerSurfaceInfo {
            layer: SceneLayer::Overlay,
            exclusive_zone: 0,
            anchor: Anchor::TOP,
        };
        let usable = arrange_layers(full(), &[overlay]);
        assert_eq!(usable, full());
    }

    #[test]
    fn multiple_exclusive_surfaces_compound() {
        let top = LayerSurfaceInfo {
            layer: SceneLayer::Top,
            exclusive_zone: 32,
            anchor: Anchor::TOP,
        };
        let bottom = LayerSurfaceInfo {
            layer: SceneLayer::Bottom,
            exclusive_zone: 48,
            anchor: Anchor::BOTTOM,
        };
        let usable = arrange_layers(full(), &[top, bottom]);
        assert_eq!(usable.loc, (0, 32).into());
        assert_eq!(usable.size, (1920, 1000).into());
    }
}
