//! `Output`: one physical display, its workspaces, tags, and focus stack
//! (SPEC_FULL.md §3, §4.2).
//!
//! Grounded on `aigi_udev/src/main.rs`'s single-output bring-up (`Output::new`,
//! physical properties, global registration) and generalized to the
//! multi-output, hot-unplug-surviving model §4.2 requires — the teacher never
//! handles output removal at all.

use std::collections::HashMap;

use smithay::utils::{Logical, Rectangle};

use crate::ids::{ContainerId, OutputId};
use crate::layout::master::StrategyRing;
use crate::tag::{LayoutKind, TagBitfield, ViewInfo, MAX_WORKSPACE};

/// Most-recently-focused at the front. A plain `Vec` rather than an
/// intrusive linked list (REDESIGN FLAGS §11); reordering is O(n) on a
/// structure that is rarely more than a few dozen entries long.
#[derive(Debug, Default, Clone)]
pub struct FocusStack {
    order: Vec<ContainerId>,
}

impl FocusStack {
    pub fn push_front(&mut self, container: ContainerId) {
        self.order.retain(|&c| c != container);
        self.order.insert(0, container);
    }

    pub fn remove(&mut self, container: ContainerId) {
        self.order.retain(|&c| c != container);
    }

    pub fn iter(&self) -> impl Iterator<Item = ContainerId> + '_ {
        self.order.iter().copied()
    }

    pub fn contains(&self, container: ContainerId) -> bool {
        self.order.contains(&container)
    }
}

/// State that survives a hot-unplug: everything §6's "Saved state" bullet
/// names. Parked in [`OutputCache`] under the output's name and rebound if
/// a display with the same name reattaches.
pub struct SavedOutputState {
    pub containers: Vec<ContainerId>,
    pub focus_stack: FocusStack,
    pub minimized: Vec<ContainerId>,
    pub active_tag: TagBitfield,
    pub active_workspace: u8,
    pub max_general_workspace: u8,
    pub view_info: Box<[ViewInfo]>,
}

/// Name-keyed cache of parked output state. Never evicts (§4.2): a display
/// that comes and goes repeatedly keeps accumulating exactly one entry per
/// distinct name, reused on every reattach.
#[derive(Default)]
pub struct OutputCache {
    entries: HashMap<String, SavedOutputState>,
}

impl OutputCache {
    pub fn park(&mut self, name: String, state: SavedOutputState) {
        self.entries.insert(name, state);
    }

    /// Removes and returns the cached state for `name`, if any, so the
    /// caller can rebind it onto a freshly (re)created `Output`.
    pub fn take(&mut self, name: &str) -> Option<SavedOutputState> {
        self.entries.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

pub struct Output {
    id: OutputId,
    name: String,
    full_area: Rectangle<i32, Logical>,
    usable_area: Rectangle<i32, Logical>,
    containers: Vec<ContainerId>,
    focus_stack: FocusStack,
    minimized: Vec<ContainerId>,
    active_tag: TagBitfield,
    active_workspace: u8,
    max_general_workspace: u8,
    view_info: Box<[ViewInfo]>,
    /// Set when this output was rebound from a cache entry rather than
    /// created fresh, so downstream scripts may skip their default setup
    /// (§4.2).
    restored: bool,
}

impl Output {
    pub fn new(id: OutputId, name: String, full_area: Rectangle<i32, Logical>) -> Self {
        Self {
            id,
            name,
            full_area,
            usable_area: full_area,
            containers: Vec::new(),
            focus_stack: FocusStack::default(),
            minimized: Vec::new(),
            active_tag: TagBitfield::single(1).expect("1 is always in range"),
            active_workspace: 1,
            max_general_workspace: MAX_WORKSPACE,
            view_info: (0..MAX_WORKSPACE as usize)
                .map(|_| ViewInfo::default())
                .collect::<Vec<_>>()
                .into_boxed_slice(),
            restored: false,
        }
    }

    /// Rebinds `cached` onto this freshly created output, replacing its
    /// default-initialized fields and marking it as restored (§4.2).
    pub fn restore(&mut self, cached: SavedOutputState) {
        self.containers = cached.containers;
        self.focus_stack = cached.focus_stack;
        self.minimized = cached.minimized;
        self.active_tag = cached.active_tag;
        self.active_workspace = cached.active_workspace;
        self.max_general_workspace = cached.max_general_workspace;
        self.view_info = cached.view_info;
        self.restored = true;
    }

    /// Parks this output's state for later `restore`, keyed by its name.
    pub fn to_saved_state(&self) -> SavedOutputState {
        SavedOutputState {
            containers: self.containers.clone(),
            focus_stack: self.focus_stack.clone(),
            minimized: self.minimized.clone(),
            active_tag: self.active_tag,
            active_workspace: self.active_workspace,
            max_general_workspace: self.max_general_workspace,
            view_info: self.view_info.clone(),
        }
    }

    pub fn id(&self) -> OutputId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn restored(&self) -> bool {
        self.restored
    }

    pub fn usable_area(&self) -> Rectangle<i32, Logical> {
        self.usable_area
    }

    pub fn full_area(&self) -> Rectangle<i32, Logical> {
        self.full_area
    }

    /// Recomputed whenever any exclusive layer-shell surface changes
    /// (§3). Returns whether the usable area actually changed, so callers
    /// know whether to re-run tiling (§4.5).
    pub fn set_usable_area(&mut self, area: Rectangle<i32, Logical>) -> bool {
        let changed = self.usable_area != area;
        self.usable_area = area;
        changed
    }

    pub fn active_workspace(&self) -> u8 {
        self.active_workspace
    }

    pub fn active_tag(&self) -> TagBitfield {
        self.active_tag
    }

    pub fn view_info(&self, workspace: u8) -> &ViewInfo {
        &self.view_info[workspace as usize - 1]
    }

    pub fn view_info_mut(&mut self, workspace: u8) -> &mut ViewInfo {
        &mut self.view_info[workspace as usize - 1]
    }

    pub fn current_view_info(&self) -> &ViewInfo {
        self.view_info(self.active_workspace)
    }

    pub fn current_view_info_mut(&mut self) -> &mut ViewInfo {
        self.view_info_mut(self.active_workspace)
    }

    pub fn containers(&self) -> &[ContainerId] {
        &self.containers
    }

    pub fn focus_stack(&self) -> &FocusStack {
        &self.focus_stack
    }

    pub fn focus_stack_mut(&mut self) -> &mut FocusStack {
        &mut self.focus_stack
    }

    pub fn minimized(&self) -> &[ContainerId] {
        &self.minimized
    }

    pub fn set_minimized_membership(&mut self, container: ContainerId, minimized: bool) {
        if minimized {
            if !self.minimized.contains(&container) {
                self.minimized.push(container);
            }
        } else {
            self.minimized.retain(|&c| c != container);
        }
    }

    pub fn add_container(&mut self, container: ContainerId) {
        if !self.containers.contains(&container) {
            self.containers.push(container);
        }
        self.focus_stack.push_front(container);
    }

    pub fn remove_container(&mut self, container: ContainerId) {
        self.containers.retain(|&c| c != container);
        self.focus_stack.remove(container);
        self.minimized.retain(|&c| c != container);
    }

    /// `active_tag ← 1<<(i-1); active_workspace ← i` (§4.2).
    pub fn view_only(&mut self, workspace: u8) -> Result<(), crate::error::TagError> {
        self.active_tag = TagBitfield::single(workspace)?;
        self.active_workspace = workspace;
        Ok(())
    }

    /// XORs bit(i-1) into `active_tag` without touching `active_workspace`
    /// (§4.2).
    pub fn toggle_tag(&mut self, workspace: u8) -> Result<(), crate::error::TagError> {
        self.active_tag = self.active_tag.toggled(workspace)?;
        Ok(())
    }

    pub fn set_useless_gaps(&mut self, workspace: u8, gap: u32) {
        self.view_info_mut(workspace).set_gap(gap);
    }

    pub fn set_mwfact(&mut self, workspace: u8, factor: f64) {
        self.view_info_mut(workspace).set_mwfact(factor);
    }

    /// Sets `workspace`'s `LayoutKind`. Only the field flip lives here —
    /// the container-facing transition semantics (inserting tileable
    /// containers into a fresh BSP tree, restoring floating rects) need the
    /// container arena `Output` doesn't own, so `AppState::set_layout_mode`
    /// calls this and then does that part itself (§4.2).
    pub fn set_layout_mode(&mut self, workspace: u8, kind: LayoutKind) {
        self.view_info_mut(workspace).layout_kind = kind;
    }

    /// Steps `workspace`'s strategy cursor `delta` positions around the
    /// registered strategy ring (`tile`, `monocle`, `fullscreen`), negative
    /// going backward (§4.2, §4.3.4).
    pub fn set_strategy_idx(&mut self, workspace: u8, delta: i32) {
        let ring = StrategyRing::default();
        let view = self.view_info_mut(workspace);
        let mut idx = view.master.strategy_idx;
        if delta >= 0 {
            for _ in 0..delta {
                idx = ring.next_idx(idx);
            }
        } else {
            for _ in 0..delta.unsigned_abs() {
                idx = ring.prev_idx(idx);
            }
        }
        view.master.strategy_idx = idx;
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

    fn container_id(map: &mut SlotMap<ContainerId, ()>) -> ContainerId {
        map.insert(())
    }

    fn full() -> Rectangle<i32, Logical> {
        Rectangle::from_loc_and_size((0, 0), (1920, 1080))
    }

    #[test]
    fn new_output_starts_on_workspace_one() {
        let out = Output::new(output_id(), "DP-1".into(), full());
        assert_eq!(out.active_workspace(), 1);
        assert_eq!(out.active_tag(), TagBitfield::single(1).unwrap());
        assert!(!out.restored());
    }

    #[test]
    fn view_only_sets_both_workspace_and_single_bit_tag() {
        let mut out = Output::new(output_id(), "DP-1".into(), full());
        out.view_only(5).unwrap();
        assert_eq!(out.active_workspace(), 5);
        assert_eq!(out.active_tag(), TagBitfield::single(5).unwrap());
    }

    #[test]
    fn toggle_tag_does_not_change_active_workspace() {
        let mut out = Output::new(output_id(), "DP-1".into(), full());
        out.view_only(1).unwrap();
        out.toggle_tag(2).unwrap();
        assert_eq!(out.active_workspace(), 1);
        assert!(out.active_tag().contains(TagBitfield::single(2).unwrap()));
    }

    #[test]
    fn focus_stack_push_front_dedupes_and_reorders() {
        let mut cmap: SlotMap<ContainerId, ()> = SlotMap::with_key();
        let a = container_id(&mut cmap);
        let b = container_id(&mut cmap);
        let mut stack = FocusStack::default();
        stack.push_front(a);
        stack.push_front(b);
        stack.push_front(a);
        assert_eq!(stack.iter().collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn cache_park_and_take_round_trips() {
        let mut cmap: SlotMap<ContainerId, ()> = SlotMap::with_key();
        let a = container_id(&mut cmap);
        let mut out = Output::new(output_id(), "DP-1".into(), full());
        out.add_container(a);
        let saved = out.to_saved_state();

        let mut cache = OutputCache::default();
        cache.park("DP-1".into(), saved);
        assert!(cache.contains("DP-1"));

        let mut fresh = Output::new(output_id(), "DP-1".into(), full());
        let restored = cache.take("DP-1").unwrap();
        fresh.restore(restored);
        assert!(fresh.restored());
        assert_eq!(fresh.containers(), &[a]);
        assert!(!cache.contains("DP-1"));
    }

    #[test]
    fn set_usable_area_reports_whether_it_changed() {
        let mut out = Output::new(output_id(), "DP-1".into(), full());
        assert!(!out.set_usable_area(full()));
        let smaller = Rectangle::from_loc_and_size((0, 0), (1920, 1040));
        assert!(out.set_usable_area(smaller));
    }

    #[test]
    fn set_layout_mode_flips_the_workspace_view_kind() {
        let mut out = Output::new(output_id(), "DP-1".into(), full());
        assert_eq!(out.view_info(1).layout_kind, crate::tag::LayoutKind::Master);
        out.set_layout_mode(1, crate::tag::LayoutKind::Bsp);
        assert_eq!(out.view_info(1).layout_kind, crate::tag::LayoutKind::Bsp);
    }

    #[test]
    fn set_strategy_idx_steps_forward_and_backward_around_the_ring() {
        let mut out = Output::new(output_id(), "DP-1".into(), full());
        assert_eq!(out.view_info(1).master.strategy_idx, 0);
        out.set_strategy_idx(1, 1);
        assert_eq!(out.view_info(1).master.strategy_idx, 1);
        out.set_strategy_idx(1, -1);
        assert_eq!(out.view_info(1).master.strategy_idx, 0);
        out.set_strategy_idx(1, -1);
        assert_eq!(out.view_info(1).master.strategy_idx, 2);
    }
}
