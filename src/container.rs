//! `Container`: the unit of tiling (SPEC_FULL.md §3, §4.1).
//!
//! Grounded on `aigi/src/tiling.rs::Tile` (the teacher's geometry-owning
//! leaf, one tile = one window) and `aigi_udev/src/state.rs`'s
//! insert/destroy toplevel lifecycle, generalized from "one tile, one
//! window" into "one container, a front-to-back stack of toplevels"
//! (§3's `Container` row). Container never touches a wire-protocol surface
//! directly — callers apply the recorded geometry to each mapped toplevel
//! after a layout pass, the same boundary `layout::master`'s `Tileable`
//! trait enforces.

use bitflags::bitflags;
use smithay::utils::{Logical, Point, Rectangle, Size};

use crate::border::Border;
use crate::error::ContainerError;
use crate::ids::{ContainerId, OutputId, ToplevelId};
use crate::layout::master::Tileable;
use crate::tag::TagBitfield;

const MIN_SIZE: i32 = 20;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ContainerState: u8 {
        const UNMANAGED  = 0b0000_0001;
        const FLOATING   = 0b0000_0010;
        const MINIMIZED  = 0b0000_0100;
        const MAXIMIZED  = 0b0000_1000;
        const FULLSCREEN = 0b0001_0000;
        const STICKY     = 0b0010_0000;
    }
}

/// One rectangle on screen that may hold multiple client windows stacked
/// front-to-back (§3's `Container` row). `toplevels[front]` is the visible
/// one; all others are disabled in the scene but retained.
pub struct Container {
    output: OutputId,
    toplevels: Vec<ToplevelId>,
    front: usize,
    rect: Rectangle<i32, Logical>,
    floating_box: Rectangle<i32, Logical>,
    workspace: u8,
    tag: TagBitfield,
    state: ContainerState,
    has_bsp_leaf: bool,
    border: Option<Border>,
    opacity: f32,
}

impl Container {
    pub fn new(output: OutputId, workspace: u8, tag: TagBitfield, rect: Rectangle<i32, Logical>) -> Self {
        Self {
            output,
            toplevels: Vec::new(),
            front: 0,
            rect,
            floating_box: rect,
            workspace,
            tag,
            state: ContainerState::empty(),
            has_bsp_leaf: false,
            border: None,
            opacity: 1.0,
        }
    }

    pub fn output(&self) -> OutputId {
        self.output
    }

    pub fn workspace(&self) -> u8 {
        self.workspace
    }

    pub fn tag(&self) -> TagBitfield {
        self.tag
    }

    pub fn rect(&self) -> Rectangle<i32, Logical> {
        self.rect
    }

    pub fn floating_box(&self) -> Rectangle<i32, Logical> {
        self.floating_box
    }

    pub fn state(&self) -> ContainerState {
        self.state
    }

    pub fn has_bsp_leaf(&self) -> bool {
        self.has_bsp_leaf
    }

    pub fn set_has_bsp_leaf(&mut self, has: bool) {
        self.has_bsp_leaf = has;
    }

    pub fn toplevels(&self) -> &[ToplevelId] {
        &self.toplevels
    }

    pub fn front_toplevel(&self) -> Option<ToplevelId> {
        self.toplevels.get(self.front).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.toplevels.is_empty()
    }

    /// Whether this container is currently allowed to be reconfigured by
    /// the layout engine or by an interactive move/resize (§4.1: "not
    /// fullscreen, not maximized").
    pub fn configure_allowed(&self) -> bool {
        !self
            .state
            .intersects(ContainerState::FULLSCREEN | ContainerState::MAXIMIZED)
    }

    /// `is_visible = Sticky ∨ (¬Minimized ∧ (active_workspace == workspace ∨
    /// active_tag ∧ tag != 0))` (§4.1).
    pub fn is_visible(&self, active_workspace: u8, active_tag: TagBitfield) -> bool {
        if self.state.contains(ContainerState::STICKY) {
            return true;
        }
        if self.state.contains(ContainerState::MINIMIZED) {
            return false;
        }
        active_workspace == self.workspace || (!active_tag.is_empty() && active_tag.contains(self.tag))
    }

    /// Appends `toplevel` to the stack. Fails silently (per §4.1) if this
    /// container is unmanaged.
    pub fn insert(&mut self, toplevel: ToplevelId) {
        if self.state.contains(ContainerState::UNMANAGED) {
            return;
        }
        self.toplevels.push(toplevel);
        self.front = self.toplevels.len() - 1;
    }

    /// Detaches `toplevel`. Returns `true` if the container is now empty
    /// and should be destroyed by the caller.
    pub fn remove(&mut self, toplevel: ToplevelId) -> Result<bool, ContainerError> {
        let Some(idx) = self.toplevels.iter().position(|&t| t == toplevel) else {
            return Ok(self.toplevels.is_empty());
        };
        self.toplevels.remove(idx);
        if self.front >= self.toplevels.len() && !self.toplevels.is_empty() {
            self.front = self.toplevels.len() - 1;
        }
        Ok(self.toplevels.is_empty())
    }

    /// Promotes `toplevel` to the front. Idempotent: re-promoting the
    /// current front is a no-op.
    pub fn set_front(&mut self, toplevel: ToplevelId) -> Result<(), ContainerError> {
        let idx = self
            .toplevels
            .iter()
            .position(|&t| t == toplevel)
            .ok_or(ContainerError::ToplevelNotFound(ContainerId::default()))?;
        self.front = idx;
        Ok(())
    }

    /// Cyclically advances the front toplevel by `n` (negative = backward).
    /// `n == 0` is a no-op.
    pub fn focusidx(&mut self, n: i32) {
        if n == 0 || self.toplevels.is_empty() {
            return;
        }
        let len = self.toplevels.len() as i32;
        let current = self.front as i32;
        let next = (current + n).rem_euclid(len);
        self.front = next as usize;
    }

    /// Container min width/height is 20px; smaller requests clamp up (§8).
    pub fn set_size(&mut self, size: Size<i32, Logical>) {
        let size = Size::from((size.w.max(MIN_SIZE), size.h.max(MIN_SIZE)));
        self.rect.size = size;
        if self.configure_allowed() && self.state.contains(ContainerState::FLOATING) {
            self.floating_box.size = size;
        }
    }

    pub fn set_position(&mut self, position: Point<i32, Logical>) {
        self.rect.loc = position;
        if self.configure_allowed() && self.state.contains(ContainerState::FLOATING) {
            self.floating_box.loc = position;
        }
    }

    /// `set_position` offset by the workspace gap on every side. Callers
    /// that want an inset cell must call `set_size` with the gap already
    /// folded into the size *before* calling this, since this only moves
    /// `rect.loc` — it does not touch `rect.size`.
    pub fn set_position_gap(&mut self, position: Point<i32, Logical>, gap: u32) {
        let gap = gap as i32;
        self.set_position((position.x + gap, position.y + gap).into());
    }

    pub fn set_geometry(&mut self, rect: Rectangle<i32, Logical>) {
        self.set_position(rect.loc);
        self.set_size(rect.size);
    }

    /// No-op if configure is disallowed. See §4.1 for the restore/disable
    /// split between enabling and disabling floating.
    pub fn set_floating(&mut self, floating: bool) {
        if !self.configure_allowed() {
            return;
        }
        if floating {
            self.rect = self.floating_box;
            self.state.insert(ContainerState::FLOATING);
        } else {
            self.state.remove(ContainerState::FLOATING);
        }
    }

    /// Enabling saves current geometry into `floating_box` (if floating)
    /// before snapping `rect` to `output_rect` (the full output area).
    /// Disabling restores the floating geometry if floating, or otherwise
    /// leaves `rect` for the next layout pass to retile. Mutually exclusive
    /// with maximized (§4.1, §3).
    pub fn set_fullscreen(
        &mut self,
        fullscreen: bool,
        output_rect: Rectangle<i32, Logical>,
    ) -> Result<(), ContainerError> {
        if fullscreen && self.state.contains(ContainerState::MAXIMIZED) {
            return Err(ContainerError::ExclusiveStateConflict(ContainerId::default()));
        }
        if fullscreen {
            if self.state.contains(ContainerState::FLOATING) {
                self.floating_box = self.rect;
            }
            self.state.insert(ContainerState::FULLSCREEN);
            self.rect = output_rect;
        } else {
            self.state.remove(ContainerState::FULLSCREEN);
            if self.state.contains(ContainerState::FLOATING) {
                self.rect = self.floating_box;
            }
        }
        Ok(())
    }

    /// As `set_fullscreen`, but snaps to `usable_area` (the output area
    /// minus reserved space such as bars) rather than the full output.
    pub fn set_maximized(
        &mut self,
        maximized: bool,
        usable_area: Rectangle<i32, Logical>,
    ) -> Result<(), ContainerError> {
        if maximized && self.state.contains(ContainerState::FULLSCREEN) {
            return Err(ContainerError::ExclusiveStateConflict(ContainerId::default()));
        }
        if maximized {
            if self.state.contains(ContainerState::FLOATING) {
                self.floating_box = self.rect;
            }
            self.state.insert(ContainerState::MAXIMIZED);
            self.rect = usable_area;
        } else {
            self.state.remove(ContainerState::MAXIMIZED);
            if self.state.contains(ContainerState::FLOATING) {
                self.rect = self.floating_box;
            }
        }
        Ok(())
    }

    /// On unminimize, deliberately snaps to the output's current
    /// active tag/workspace rather than restoring the one it was minimized
    /// from (§4.1: "here, now", not "back to where it was").
    pub fn set_minimized(&mut self, minimized: bool, active_workspace: u8, active_tag: TagBitfield) {
        if minimized {
            self.state.insert(ContainerState::MINIMIZED);
        } else {
            self.state.remove(ContainerState::MINIMIZED);
            self.workspace = active_workspace;
            self.tag = active_tag;
        }
    }

    pub fn set_sticky(&mut self, sticky: bool) {
        self.state.set(ContainerState::STICKY, sticky);
    }

    pub fn move_to_tag(&mut self, workspace: u8) -> Result<(), crate::error::TagError> {
        self.tag = TagBitfield::single(workspace)?;
        self.workspace = workspace;
        Ok(())
    }

    pub fn border(&self) -> Option<&Border> {
        self.border.as_ref()
    }

    pub fn border_mut(&mut self) -> Option<&mut Border> {
        self.border.as_mut()
    }

    pub fn set_border(&mut self, border: Option<Border>) {
        self.border = border;
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    /// Exchanges the full toplevel populations of two containers, preserving
    /// each container's identity, geometry, and workspace, and restoring
    /// each side's front toplevel (§4.1).
    pub fn swap(a: &mut Container, b: &mut Container) {
        std::mem::swap(&mut a.toplevels, &mut b.toplevels);
        std::mem::swap(&mut a.front, &mut b.front);
    }
}

impl Tileable for Container {
    fn set_size(&mut self, size: Size<i32, Logical>) {
        Container::set_size(self, size)
    }

    fn set_position_gap(&mut self, point: Point<i32, Logical>, gap: u32) {
        Container::set_position_gap(self, point, gap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn output_id() -> OutputId {
        let mut map: SlotMap<OutputId, ()> = SlotMap::with_key();
        map.insert(())
    }

    fn toplevel_id(map: &mut SlotMap<ToplevelId, ()>) -> ToplevelId {
        map.insert(())
    }

    fn rect() -> Rectangle<i32, Logical> {
        Rectangle::from_loc_and_size((0, 0), (800, 600))
    }

    #[test]
    fn insert_and_remove_tracks_emptiness() {
        let mut tops: SlotMap<ToplevelId, ()> = SlotMap::with_key();
        let mut c = Container::new(output_id(), 1, TagBitfield::single(1).unwrap(), rect());
        let a = toplevel_id(&mut tops);
        c.insert(a);
        assert!(!c.is_empty());
        assert_eq!(c.remove(a).unwrap(), true);
        assert!(c.is_empty());
    }

    #[test]
    fn unmanaged_container_silently_rejects_insert() {
        let mut tops: SlotMap<ToplevelId, ()> = SlotMap::with_key();
        let mut c = Container::new(output_id(), 1, TagBitfield::single(1).unwrap(), rect());
        c.state.insert(ContainerState::UNMANAGED);
        let a = toplevel_id(&mut tops);
        c.insert(a);
        assert!(c.is_empty());
    }

    #[test]
    fn focusidx_wraps_cyclically() {
        let mut tops: SlotMap<ToplevelId, ()> = SlotMap::with_key();
        let mut c = Container::new(output_id(), 1, TagBitfield::single(1).unwrap(), rect());
        for _ in 0..3 {
            let t = toplevel_id(&mut tops);
            c.insert(t);
        }
        assert_eq!(c.front, 2);
        c.focusidx(1);
        assert_eq!(c.front, 0);
        c.focusidx(-1);
        assert_eq!(c.front, 2);
    }

    #[test]
    fn fullscreen_and_maximized_are_mutually_exclusive() {
        let mut c = Container::new(output_id(), 1, TagBitfield::single(1).unwrap(), rect());
        c.set_fullscreen(true, rect()).unwrap();
        assert!(c.set_maximized(true, rect()).is_err());
    }

    #[test]
    fn fullscreen_snaps_floating_container_to_output_rect_and_restores_on_disable() {
        let mut c = Container::new(output_id(), 1, TagBitfield::single(1).unwrap(), rect());
        c.set_floating(true);
        c.set_geometry(Rectangle::from_loc_and_size((100, 100), (640, 480)));
        let output_rect = Rectangle::from_loc_and_size((0, 0), (1920, 1080));
        c.set_fullscreen(true, output_rect).unwrap();
        assert_eq!(c.rect(), output_rect);
        c.set_fullscreen(false, output_rect).unwrap();
        assert_eq!(c.rect(), Rectangle::from_loc_and_size((100, 100), (640, 480)));
    }

    #[test]
    fn set_size_clamps_up_to_minimum() {
        let mut c = Container::new(output_id(), 1, TagBitfield::single(1).unwrap(), rect());
        c.set_size((5, 5).into());
        assert_eq!(c.rect().size, (20, 20).into());
    }

    #[test]
    fn set_geometry_applies_size_not_position_to_size() {
        let mut c = Container::new(output_id(), 1, TagBitfield::single(1).unwrap(), rect());
        c.set_geometry(Rectangle::from_loc_and_size((10, 20), (300, 400)));
        assert_eq!(c.rect().loc, (10, 20).into());
        assert_eq!(c.rect().size, (300, 400).into());
    }

    #[test]
    fn unminimize_snaps_to_current_active_view_not_saved_one() {
        let mut c = Container::new(output_id(), 3, TagBitfield::single(3).unwrap(), rect());
        c.set_minimized(true, 3, TagBitfield::single(3).unwrap());
        c.set_minimized(false, 7, TagBitfield::single(7).unwrap());
        assert_eq!(c.workspace(), 7);
        assert_eq!(c.tag(), TagBitfield::single(7).unwrap());
    }

    #[test]
    fn sticky_container_is_always_visible() {
        let mut c = Container::new(output_id(), 1, TagBitfield::single(1).unwrap(), rect());
        c.set_sticky(true);
        assert!(c.is_visible(9, TagBitfield::single(9).unwrap()));
    }

    #[test]
    fn minimized_container_is_never_visible_even_on_its_own_workspace() {
        let mut c = Container::new(output_id(), 2, TagBitfield::single(2).unwrap(), rect());
        c.set_minimized(true, 2, TagBitfield::single(2).unwrap());
        assert!(!c.is_visible(2, TagBitfield::single(2).unwrap()));
    }

    #[test]
    fn swap_exchanges_toplevel_populations_but_not_geometry() {
        let mut tops: SlotMap<ToplevelId, ()> = SlotMap::with_key();
        let mut a = Container::new(output_id(), 1, TagBitfield::single(1).unwrap(), rect());
        let mut b = Container::new(output_id(), 2, TagBitfield::single(2).unwrap(), rect());
        let ta = toplevel_id(&mut tops);
        let tb = toplevel_id(&mut tops);
        a.insert(ta);
        b.insert(tb);
        Container::swap(&mut a, &mut b);
        assert_eq!(a.toplevels(), &[tb]);
        assert_eq!(b.toplevels(), &[ta]);
        assert_eq!(a.workspace(), 1);
        assert_eq!(b.workspace(), 2);
    }
}
