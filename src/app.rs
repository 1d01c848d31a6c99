//! Protocol glue: wires the arena-based domain model onto Smithay's wire
//! protocol state machines (SPEC_FULL.md §4.8, §5, §10).
//!
//! Grounded on `aigi_udev/src/state.rs::AIGIState` — the struct shape,
//! `CompositorHandler::commit`'s `on_commit_buffer_handler` + initial-configure
//! dance, and the `delegate_*!` macro pattern are all carried over close to
//! verbatim. What changes is everything downstream of "a toplevel surface
//! exists": instead of `TilingState::split`/`insert_head` working directly on
//! a `Space<Window>`, toplevels are handed to [`crate::container::Container`]s
//! governed by the per-workspace layout engine in [`crate::layout`], and the
//! `Space` is kept only as the thin bridge Smithay's input/render helpers
//! still expect (`space.map_element`, `space.output_geometry`).

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;

use slotmap::SlotMap;
use smithay::desktop::{layer_map_for_output, PopupManager, Space, Window};
use smithay::input::pointer::{CursorIcon, CursorImageStatus, PointerHandle};
use smithay::input::{Seat, SeatHandler, SeatState};
use smithay::output::Output as WlOutput;
use smithay::reexports::calloop::LoopHandle;
use smithay::reexports::wayland_server::backend::{ClientData, ClientId, DisconnectReason};
use smithay::reexports::wayland_server::protocol::wl_buffer;
use smithay::reexports::wayland_server::protocol::wl_seat;
use smithay::reexports::wayland_server::protocol::wl_surface::WlSurface;
use smithay::reexports::wayland_server::{Client, Display, DisplayHandle};
use smithay::utils::{Logical, Point, Rectangle, Serial, SERIAL_COUNTER};
use smithay::wayland::buffer::BufferHandler;
use smithay::wayland::compositor::{
    with_states, CompositorClientState, CompositorHandler, CompositorState,
};
use smithay::wayland::cursor_shape::{CursorShapeHandler, CursorShapeManagerState};
use smithay::wayland::output::OutputManagerState;
use smithay::wayland::pointer_constraints::{
    with_pointer_constraint, PointerConstraintsHandler, PointerConstraintsState,
};
use smithay::wayland::selection::data_device::{
    ClientDndGrabHandler, DataDeviceHandler, DataDeviceState, ServerDndGrabHandler,
};
use smithay::wayland::session_lock::{
    LockSurface, SessionLockHandler, SessionLockManagerState, SessionLocker,
};
use smithay::wayland::virtual_keyboard::VirtualKeyboardManagerState;
use smithay::wayland::shell::wlr_layer::{
    Layer as WlrLayer, LayerSurface, WlrLayerShellHandler, WlrLayerShellState,
};
use smithay::wayland::shell::xdg::decoration::{XdgDecorationHandler, XdgDecorationState};
use smithay::wayland::shell::xdg::{
    PopupSurface, PositionerState, ToplevelSurface, XdgShellHandler, XdgShellState,
    XdgToplevelSurfaceData,
};
use smithay::wayland::shm::{ShmHandler, ShmState};
use smithay::{
    delegate_compositor, delegate_cursor_shape, delegate_data_device, delegate_layer_shell,
    delegate_output, delegate_pointer_constraints, delegate_seat, delegate_session_lock,
    delegate_shm, delegate_virtual_keyboard_manager, delegate_xdg_decoration, delegate_xdg_shell,
};

use crate::border::Border;
use crate::config::Config;
use crate::container::{Container, ContainerState};
use crate::cursor;
use crate::ids::{ContainerId, OutputId, ToplevelId};
use crate::input::keybinding::KeybindTable;
use crate::input::pointer_constraint::PointerConstraint;
use crate::input::router::CursorState;
use crate::input::InputRouter;
use crate::layer_shell::{self, Anchor as LayerAnchor, LayerSurfaceInfo};
use crate::layout::{self, master::StrategyRing};
use crate::output::{Output, OutputCache};
use crate::scene::{NullSceneBackend, SceneBackend};
use crate::session_lock::SessionLock;
use crate::signal::SignalBus;
use crate::tag::LayoutKind;
use crate::toplevel::{Toplevel, ToplevelKind};

/// Per-client compositor bookkeeping. Carried over verbatim from the
/// teacher — `CompositorClientState` is all any client needs tracked today.
#[derive(Default)]
pub struct ClientState {
    pub compositor_state: CompositorClientState,
}

impl ClientData for ClientState {
    fn disconnected(&self, _client_id: ClientId, _reason: DisconnectReason) {}
}

/// A keyboard chord/button action, the opaque command the CLI/config hand
/// the keybind table (§4.4). The core never interprets the string; a
/// startup-command runner or scripting host does.
#[derive(Debug, Clone)]
pub enum Action {
    Spawn(String),
    Quit,
    FocusNext,
    FocusPrev,
    ToggleFloating,
    ToggleFullscreen,
    ToggleMaximized,
    ToggleSplit,
    ViewTag(u8),
    ToggleTag(u8),
    SetLayoutMode(LayoutKind),
    CycleStrategy(i32),
}

/// One mapped layer-shell surface, tracked the way `Container`s are, but
/// outside the tiling arenas since layer surfaces are never tiled (§4.5).
struct MappedLayer {
    surface: LayerSurface,
    output: OutputId,
}

/// Everything the event loop owns: the domain-model arenas, Smithay's
/// protocol states, and this crate's own input/layout/signal subsystems.
/// Generalizes `AIGIState` past a single hardcoded `TilingState` + `Space`
/// pair into the full per-output, per-workspace model SPEC_FULL.md's data
/// model describes.
pub struct AppState {
    pub display_handle: DisplayHandle,
    pub loop_handle: LoopHandle<'static, AppState>,
    pub running: AtomicBool,

    // Domain-model arenas (REDESIGN FLAGS §9/§11: slotmap, not Rc<RefCell<_>>).
    pub outputs: SlotMap<OutputId, Output>,
    pub containers: SlotMap<ContainerId, Container>,
    pub toplevels: SlotMap<ToplevelId, Toplevel>,
    pub toplevel_of_surface: HashMap<WlSurface, ToplevelId>,
    pub wl_outputs: HashMap<OutputId, WlOutput>,
    pub output_cache: OutputCache,
    pub active_output: Option<OutputId>,
    pub layer_surfaces: Vec<MappedLayer>,

    // Smithay's own bookkeeping, kept around because the input/render
    // helpers in `smithay::desktop` are written against it.
    pub space: Space<Window>,
    pub popups: PopupManager,

    // Protocol globals.
    pub compositor_state: CompositorState,
    pub output_manager_state: OutputManagerState,
    pub seat_state: SeatState<Self>,
    pub shm_state: ShmState,
    pub xdg_shell_state: XdgShellState,
    pub data_device_state: DataDeviceState,
    pub layer_shell_state: WlrLayerShellState,
    pub session_lock_state: SessionLockManagerState,
    pub xdg_decoration_state: XdgDecorationState,
    pub pointer_constraints_state: PointerConstraintsState,
    pub cursor_shape_manager_state: CursorShapeManagerState,
    pub virtual_keyboard_manager_state: VirtualKeyboardManagerState,

    // Input.
    pub seat: Seat<Self>,
    pub pointer_location: Point<f64, Logical>,
    pub cursor_status: CursorImageStatus,
    pub input_router: InputRouter,
    pub keybinds: KeybindTable<Action>,
    pub pointer_constraint: Option<PointerConstraint>,

    // The crate's own subsystems.
    pub signals: SignalBus,
    pub session_lock: SessionLock,
    pub scene: NullSceneBackend,
    pub config: Config,
}

impl AppState {
    pub fn init(
        loop_handle: LoopHandle<'static, AppState>,
        display: &mut Display<Self>,
        config: Config,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let dh = display.handle();

        let compositor_state = CompositorState::new::<Self>(&dh);
        let shm_state = ShmState::new::<Self>(&dh, vec![]);
        let output_manager_state = OutputManagerState::new_with_xdg_output::<Self>(&dh);
        let xdg_shell_state = XdgShellState::new::<Self>(&dh);
        let data_device_state = DataDeviceState::new::<Self>(&dh);
        let layer_shell_state = WlrLayerShellState::new::<Self>(&dh);
        let session_lock_state = SessionLockManagerState::new::<Self, _>(&dh, |_| true);
        let xdg_decoration_state = XdgDecorationState::new::<Self>(&dh);
        let pointer_constraints_state = PointerConstraintsState::new::<Self>(&dh);
        let cursor_shape_manager_state = CursorShapeManagerState::new::<Self>(&dh);
        // Virtual keyboards feed key events through the same `Seat` as any
        // physical one; no dedicated handler trait exists, the client just
        // gets a `virtual_keyboard` global to create one against (§6
        // "virtual keyboard/pointer creation").
        let virtual_keyboard_manager_state = VirtualKeyboardManagerState::new::<Self, _>(&dh, |_client| true);

        let mut seat_state = SeatState::<Self>::new();
        let mut seat: Seat<Self> = seat_state.new_wl_seat(&dh, "seat0");
        seat.add_keyboard(Default::default(), 500, 250)?;
        seat.add_pointer();

        let mut keybinds = KeybindTable::default();
        install_default_binds(&mut keybinds, &config);

        Ok(AppState {
            display_handle: dh,
            loop_handle,
            running: AtomicBool::new(true),

            outputs: SlotMap::with_key(),
            containers: SlotMap::with_key(),
            toplevels: SlotMap::with_key(),
            toplevel_of_surface: HashMap::new(),
            wl_outputs: HashMap::new(),
            output_cache: OutputCache::default(),
            active_output: None,
            layer_surfaces: Vec::new(),

            space: Space::default(),
            popups: PopupManager::default(),

            compositor_state,
            output_manager_state,
            seat_state,
            shm_state,
            xdg_shell_state,
            data_device_state,
            layer_shell_state,
            session_lock_state,
            xdg_decoration_state,
            pointer_constraints_state,
            cursor_shape_manager_state,
            virtual_keyboard_manager_state,

            seat,
            pointer_location: (0.0, 0.0).into(),
            cursor_status: CursorImageStatus::default_named(),
            input_router: InputRouter::default(),
            keybinds,
            pointer_constraint: None,

            signals: SignalBus::default(),
            session_lock: SessionLock::default(),
            scene: NullSceneBackend::new(),
            config,
        })
    }

    /// Registers a freshly created `Output`, rebinding cached state from a
    /// previous hot-unplug if the name matches (§4.2).
    pub fn add_output(&mut self, name: String, wl_output: WlOutput, geometry: Rectangle<i32, Logical>) -> OutputId {
        let id = self
            .outputs
            .insert_with_key(|id| Output::new(id, name.clone(), geometry));
        if let Some(cached) = self.output_cache.take(&name) {
            self.outputs[id].restore(cached);
        }
        self.space.map_output(&wl_output, geometry.loc);
        self.wl_outputs.insert(id, wl_output);
        if self.active_output.is_none() {
            self.active_output = Some(id);
        }
        id
    }

    /// Parks an output's state and forgets it, mirroring a hot-unplug
    /// (§4.2: "Saved state" survives under the output's name).
    pub fn remove_output(&mut self, id: OutputId) {
        if let Some(output) = self.outputs.get(&id) {
            self.output_cache.park(output.name().to_owned(), output.to_saved_state());
        }
        if let Some(wl_output) = self.wl_outputs.remove(&id) {
            self.space.unmap_output(&wl_output);
        }
        self.outputs.remove(id);
        if self.active_output == Some(id) {
            self.active_output = self.outputs.keys().next();
        }
    }

    /// Creates a tiled container on `output`'s active workspace and inserts
    /// it into that workspace's layout engine (BSP gets an explicit
    /// `insert`; master/floating place by re-running `arrange_output`).
    fn spawn_container(&mut self, output_id: OutputId, rect: Rectangle<i32, Logical>) -> ContainerId {
        let (workspace, tag) = {
            let output = &self.outputs[output_id];
            (output.active_workspace(), output.active_tag())
        };
        let container_id = self.containers.insert(Container::new(output_id, workspace, tag, rect));
        {
            let border = Border::create(&mut self.scene, container_id, &self.config.border);
            self.containers[container_id].set_border(Some(border));
        }
        let output = &mut self.outputs[output_id];
        output.add_container(container_id);
        let view = output.view_info_mut(workspace);
        if view.layout_kind == LayoutKind::Bsp {
            let area = output.usable_area();
            if view.bsp.insert(container_id, area).is_ok() {
                self.containers[container_id].set_has_bsp_leaf(true);
            }
        }
        container_id
    }

    /// Containers visible on `workspace`/`active_tag` that the layout engine
    /// is allowed to reposition: not fullscreen/maximized, not floating or
    /// unmanaged (§4.1, §4.3).
    fn tileable_container_ids(&self, output_id: OutputId, workspace: u8, active_tag: crate::tag::TagBitfield) -> Vec<ContainerId> {
        self.outputs[output_id]
            .containers()
            .iter()
            .copied()
            .filter(|&id| {
                let c = &self.containers[id];
                c.is_visible(workspace, active_tag)
                    && c.configure_allowed()
                    && !c.state().intersects(ContainerState::FLOATING | ContainerState::UNMANAGED)
            })
            .collect()
    }

    /// Runs the active layout engine over every visible, tileable container
    /// of `output`'s current workspace and applies the resulting geometry
    /// directly to each container (§4.3).
    pub fn arrange_output(&mut self, output_id: OutputId) {
        let Some(output) = self.outputs.get(output_id) else {
            return;
        };
        let workspace = output.active_workspace();
        let active_tag = output.active_tag();
        let usable_area = output.usable_area();
        let view = output.current_view_info();
        let layout_kind = view.layout_kind;
        let gap = view.gap;
        let mwfact = view.master.mwfact;
        let master_count = view.master.master_count;
        let strategy_idx = view.master.strategy_idx;

        let tileable_ids = self.tileable_container_ids(output_id, workspace, active_tag);

        match layout_kind {
            LayoutKind::Floating => layout::floating::arrange(),
            LayoutKind::Master => {
                let ring = StrategyRing::default();
                let mut refs: Vec<&mut dyn layout::master::Tileable> = tileable_ids
                    .iter()
                    .map(|&id| &mut self.containers[id] as &mut dyn layout::master::Tileable)
                    .collect();
                layout::master::arrange(&ring, strategy_idx, &mut refs, usable_area, mwfact, gap, master_count);
            }
            LayoutKind::Bsp => {
                let bsp = self.outputs[output_id].view_info(workspace).bsp.clone();
                bsp.for_each_leaf(|container, rect, enabled| {
                    if let Some(c) = self.containers.get_mut(container) {
                        if enabled && c.configure_allowed() {
                            c.set_geometry(rect);
                        }
                    }
                });
            }
        }

        self.apply_container_geometry(output_id);
    }

    /// Changes `output`'s active workspace's `LayoutKind` and applies the
    /// §4.2 transition semantics: switching to BSP inserts every currently
    /// tileable container that doesn't already have a leaf; switching to
    /// Floating restores every visible floating container's saved rect.
    /// Switching to Master needs no transition work — `arrange_output`
    /// already ignores disabled BSP leaves and untouched floating rects.
    pub fn set_layout_mode(&mut self, output_id: OutputId, kind: LayoutKind) {
        let workspace = self.outputs[output_id].active_workspace();
        let active_tag = self.outputs[output_id].active_tag();
        self.outputs[output_id].set_layout_mode(workspace, kind);

        match kind {
            LayoutKind::Bsp => {
                for id in self.tileable_container_ids(output_id, workspace, active_tag) {
                    if self.containers[id].has_bsp_leaf() {
                        continue;
                    }
                    let rect = self.containers[id].rect();
                    let view = self.outputs[output_id].view_info_mut(workspace);
                    if view.bsp.insert(id, rect).is_ok() {
                        self.containers[id].set_has_bsp_leaf(true);
                    }
                }
            }
            LayoutKind::Floating => {
                let ids = self.outputs[output_id].containers().to_vec();
                for id in ids {
                    let c = &mut self.containers[id];
                    if c.is_visible(workspace, active_tag) && c.state().contains(ContainerState::FLOATING) {
                        c.set_floating(true);
                    }
                }
            }
            LayoutKind::Master => {}
        }

        self.arrange_output(output_id);
    }

    /// Enables or disables floating on `container_id`, threading the §4.1
    /// BSP-leaf lifecycle through: enabling disables any existing leaf
    /// (without removing it, so the tree position survives); disabling
    /// re-enables that leaf, or inserts a fresh one if the workspace is on
    /// BSP and the container never had one.
    pub fn set_container_floating(&mut self, container_id: ContainerId, floating: bool) {
        let output_id = self.containers[container_id].output();
        let workspace = self.containers[container_id].workspace();

        if floating {
            if self.containers[container_id].has_bsp_leaf() {
                let _ = self.outputs[output_id]
                    .view_info_mut(workspace)
                    .bsp
                    .set_enabled(container_id, false);
            }
            self.containers[container_id].set_floating(true);
        } else {
            self.containers[container_id].set_floating(false);
            let layout_kind = self.outputs[output_id].view_info(workspace).layout_kind;
            if layout_kind == LayoutKind::Bsp {
                if self.containers[container_id].has_bsp_leaf() {
                    let _ = self.outputs[output_id]
                        .view_info_mut(workspace)
                        .bsp
                        .set_enabled(container_id, true);
                } else {
                    let rect = self.containers[container_id].rect();
                    let view = self.outputs[output_id].view_info_mut(workspace);
                    if view.bsp.insert(container_id, rect).is_ok() {
                        self.containers[container_id].set_has_bsp_leaf(true);
                    }
                }
            }
        }
    }

    /// Pushes each container's recorded rectangle down onto its front
    /// toplevel's surface and border, and into the `Space` bridge so
    /// Smithay's own input/render helpers see the same layout (§4.1, §3).
    fn apply_container_geometry(&mut self, output_id: OutputId) {
        let container_ids: Vec<ContainerId> = self.outputs[output_id].containers().to_vec();
        for container_id in container_ids {
            let (rect, front, border_thickness) = {
                let c = &self.containers[container_id];
                (c.rect(), c.front_toplevel(), c.border().map(|b| b.thickness()))
            };
            if let Some(thickness) = border_thickness {
                let inner = Rectangle::from_loc_and_size(
                    (rect.loc.x + thickness as i32, rect.loc.y + thickness as i32),
                    (
                        (rect.size.w - 2 * thickness as i32).max(0),
                        (rect.size.h - 2 * thickness as i32).max(0),
                    ),
                );
                if let Some(border) = self.containers[container_id].border() {
                    border.layout(&mut self.scene, inner.loc, inner.size);
                }
            }
            let Some(toplevel_id) = front else { continue };
            let Some(toplevel) = self.toplevels.get(toplevel_id) else {
                continue;
            };
            if let ToplevelKind::Native(surface) = &toplevel.kind {
                surface.with_pending_state(|state| {
                    state.size = Some(rect.size);
                });
                surface.send_configure();
                if let Some(window) = self
                    .space
                    .elements()
                    .find(|w| w.toplevel().wl_surface() == surface.wl_surface())
                    .cloned()
                {
                    self.space.map_element(window, rect.loc, false);
                }
            }
        }
    }

    /// Re-derives `usable_area` for every output from its mapped layer-shell
    /// surfaces (§4.5) and re-runs layout on any output whose usable area
    /// actually changed.
    pub fn recompute_layer_arrangement(&mut self, output_id: OutputId) {
        let Some(wl_output) = self.wl_outputs.get(&output_id) else {
            return;
        };
        let full_area = self.outputs[output_id].full_area();
        let infos: Vec<LayerSurfaceInfo> = {
            let map = layer_map_for_output(wl_output);
            map.layers()
                .map(|layer| LayerSurfaceInfo {
                    layer: scene_layer_of(layer.layer()),
                    exclusive_zone: layer.cached_state().exclusive_zone.max(0),
                    anchor: anchor_of(layer.cached_state().anchor),
                })
                .collect()
        };
        let usable = layer_shell::arrange_layers(full_area, &infos);
        let changed = self.outputs.get_mut(output_id).map(|o| o.set_usable_area(usable)).unwrap_or(false);
        if changed {
            self.arrange_output(output_id);
        }
    }

    /// Sets keyboard focus to `surface` (or clears it) and, if the surface
    /// belongs to a tracked toplevel, moves its container to the front of
    /// the owning output's focus stack (§4.2's "most-recently-focused at
    /// front" rule). Grounded on `aigi/src/input_handler.rs::handle_input`'s
    /// `PointerMotion` arm, which re-focuses on every pointer move
    /// (focus-follows-mouse) rather than waiting for an explicit click.
    pub fn focus_surface(&mut self, surface: Option<WlSurface>) {
        if let Some(surface) = &surface {
            if let Some(&toplevel_id) = self.toplevel_of_surface.get(surface) {
                if let Some(container_id) = self.toplevels[toplevel_id].container() {
                    let output_id = self.containers[container_id].output();
                    self.outputs[output_id].focus_stack_mut().push_front(container_id);
                }
            }
        }
        let Some(keyboard) = self.seat.get_keyboard() else {
            return;
        };
        let serial = SERIAL_COUNTER.next_serial();
        keyboard.set_focus(self, surface, serial);
    }

    /// Applies pointer motion to an active interactive move/resize grab.
    /// Returns `true` if a grab consumed the motion — the caller should skip
    /// focus-follows-mouse and client-surface motion forwarding in that case
    /// (§4.4: the grabbed container tracks the cursor, nothing else does).
    pub fn handle_grab_motion(&mut self, cursor: Point<i32, Logical>) -> bool {
        match self.input_router.state() {
            CursorState::Move { container, .. } => {
                if let Some(pos) = self.input_router.handle_move_motion(cursor) {
                    if let Some(c) = self.containers.get_mut(container) {
                        c.set_position(pos);
                    }
                    if let Some(output_id) = self.active_output {
                        self.apply_container_geometry(output_id);
                    }
                }
                true
            }
            CursorState::Resize { container, .. } => {
                if let Some(rect) = self.input_router.handle_resize_motion(cursor) {
                    if let Some(c) = self.containers.get_mut(container) {
                        c.set_geometry(rect);
                    }
                    if let Some(output_id) = self.active_output {
                        self.apply_container_geometry(output_id);
                    }
                }
                true
            }
            CursorState::Normal => false,
        }
    }

    /// Ends any active interactive grab (on pointer-button release),
    /// flushing a final coalesced resize rect if one was still pending.
    pub fn stop_grab(&mut self) {
        let container = match self.input_router.state() {
            CursorState::Move { container, .. } | CursorState::Resize { container, .. } => Some(container),
            CursorState::Normal => None,
        };
        let pending = self.input_router.stop_interactive();
        if let (Some(container), Some(rect)) = (container, pending) {
            if let Some(c) = self.containers.get_mut(container) {
                c.set_geometry(rect);
            }
            if let Some(output_id) = self.active_output {
                self.apply_container_geometry(output_id);
            }
        }
    }

    /// Moves keyboard focus to the next/previous container in the active
    /// output's focus stack, cyclically. `n` is usually ±1.
    fn cycle_focus(&mut self, n: i32) {
        let Some(output_id) = self.active_output else {
            return;
        };
        let order: Vec<ContainerId> = self.outputs[output_id].focus_stack().iter().collect();
        if order.is_empty() {
            return;
        }
        let current = order.first().copied();
        let pool: Vec<ContainerId> = self.outputs[output_id]
            .containers()
            .iter()
            .copied()
            .filter(|id| !self.containers[*id].state().contains(ContainerState::MINIMIZED))
            .collect();
        if pool.is_empty() {
            return;
        }
        let current_idx = current.and_then(|c| pool.iter().position(|&id| id == c)).unwrap_or(0);
        let len = pool.len() as i32;
        let next_idx = (current_idx as i32 + n).rem_euclid(len) as usize;
        let next_container = pool[next_idx];
        let surface = self.containers[next_container]
            .front_toplevel()
            .and_then(|t| self.toplevels.get(t))
            .and_then(|t| match &t.kind {
                ToplevelKind::Native(s) => Some(s.wl_surface().clone()),
                ToplevelKind::Legacy => None,
            });
        self.focus_surface(surface);
    }

    /// Executes a keybind-table action (§4.4). The table itself never
    /// interprets `Action`; this is the one place that does.
    pub fn execute_action(&mut self, action: Action) {
        match action {
            Action::Spawn(command) => {
                let mut parts = command.split_whitespace();
                if let Some(program) = parts.next() {
                    match std::process::Command::new(program).args(parts).spawn() {
                        Ok(_) => tracing::info!(command = %command, "spawned"),
                        Err(err) => tracing::warn!(command = %command, %err, "failed to spawn"),
                    }
                }
            }
            Action::Quit => self.running.store(false, std::sync::atomic::Ordering::SeqCst),
            Action::FocusNext => self.cycle_focus(1),
            Action::FocusPrev => self.cycle_focus(-1),
            Action::ToggleFloating => {
                if let Some(id) = self.focused_container() {
                    let floating = self.containers[id].state().contains(ContainerState::FLOATING);
                    self.set_container_floating(id, !floating);
                    if let Some(output_id) = self.active_output {
                        self.arrange_output(output_id);
                    }
                }
            }
            Action::ToggleFullscreen => {
                if let Some(id) = self.focused_container() {
                    let fullscreen = self.containers[id].state().contains(ContainerState::FULLSCREEN);
                    let output_rect = self.outputs[self.containers[id].output()].full_area();
                    let _ = self.containers[id].set_fullscreen(!fullscreen, output_rect);
                    if let Some(output_id) = self.active_output {
                        self.arrange_output(output_id);
                    }
                }
            }
            Action::ToggleMaximized => {
                if let Some(id) = self.focused_container() {
                    let maximized = self.containers[id].state().contains(ContainerState::MAXIMIZED);
                    let usable_area = self.outputs[self.containers[id].output()].usable_area();
                    let _ = self.containers[id].set_maximized(!maximized, usable_area);
                    if let Some(output_id) = self.active_output {
                        self.arrange_output(output_id);
                    }
                }
            }
            Action::ToggleSplit => {
                if let (Some(output_id), Some(container_id)) = (self.active_output, self.focused_container()) {
                    let workspace = self.outputs[output_id].active_workspace();
                    let _ = self.outputs[output_id]
                        .view_info_mut(workspace)
                        .bsp
                        .toggle_split(container_id);
                    self.arrange_output(output_id);
                }
            }
            Action::ViewTag(tag) => {
                if let Some(output_id) = self.active_output {
                    if self.outputs[output_id].view_only(tag).is_ok() {
                        self.arrange_output(output_id);
                    }
                }
            }
            Action::ToggleTag(tag) => {
                if let Some(output_id) = self.active_output {
                    if self.outputs[output_id].toggle_tag(tag).is_ok() {
                        self.arrange_output(output_id);
                    }
                }
            }
            Action::SetLayoutMode(kind) => {
                if let Some(output_id) = self.active_output {
                    self.set_layout_mode(output_id, kind);
                }
            }
            Action::CycleStrategy(delta) => {
                if let Some(output_id) = self.active_output {
                    let workspace = self.outputs[output_id].active_workspace();
                    self.outputs[output_id].set_strategy_idx(workspace, delta);
                    self.arrange_output(output_id);
                }
            }
        }
    }

    /// The container backing whatever toplevel currently has keyboard focus.
    fn focused_container(&self) -> Option<ContainerId> {
        let surface = self.seat.get_keyboard()?.current_focus()?;
        let toplevel_id = *self.toplevel_of_surface.get(&surface)?;
        self.toplevels.get(toplevel_id)?.container()
    }

    /// Most-recently-focused *visible* toplevel on `output`, used to decide
    /// who gets focus back after the session lock releases (§4.4, §4.6).
    pub fn newest_focus_visible_toplevel(&self, output_id: OutputId) -> Option<ToplevelId> {
        let output = self.outputs.get(output_id)?;
        let workspace = output.active_workspace();
        let tag = output.active_tag();
        output
            .focus_stack()
            .iter()
            .filter(|&id| {
                self.containers
                    .get(id)
                    .map(|c| c.is_visible(workspace, tag))
                    .unwrap_or(false)
            })
            .find_map(|id| self.containers.get(id).and_then(|c| c.front_toplevel()))
    }
}

fn scene_layer_of(layer: WlrLayer) -> crate::scene::SceneLayer {
    use crate::scene::SceneLayer;
    match layer {
        WlrLayer::Background => SceneLayer::Background,
        WlrLayer::Bottom => SceneLayer::Bottom,
        WlrLayer::Top => SceneLayer::Top,
        WlrLayer::Overlay => SceneLayer::Overlay,
    }
}

fn anchor_of(anchor: smithay::wayland::shell::wlr_layer::Anchor) -> LayerAnchor {
    use smithay::wayland::shell::wlr_layer::Anchor as WlrAnchor;
    let mut out = LayerAnchor::empty();
    if anchor.contains(WlrAnchor::TOP) {
        out |= LayerAnchor::TOP;
    }
    if anchor.contains(WlrAnchor::BOTTOM) {
        out |= LayerAnchor::BOTTOM;
    }
    if anchor.contains(WlrAnchor::LEFT) {
        out |= LayerAnchor::LEFT;
    }
    if anchor.contains(WlrAnchor::RIGHT) {
        out |= LayerAnchor::RIGHT;
    }
    out
}

/// Installs the config's keybind entries plus a handful of hardcoded
/// fallbacks, mirroring `aigi/src/input_handler.rs::handle_input`'s own
/// four-key table as the built-in defaults when a config supplies none.
fn install_default_binds(table: &mut KeybindTable<Action>, config: &Config) {
    use crate::input::keybinding::Modifiers;
    if config.keybinds.is_empty() {
        table.bind(Modifiers::LOGO, b'Q' as u32, Some(Action::Quit), None);
        table.bind(Modifiers::LOGO, b'J' as u32, Some(Action::FocusNext), None);
        table.bind(Modifiers::LOGO, b'K' as u32, Some(Action::FocusPrev), None);
        table.bind(Modifiers::LOGO, b'V' as u32, Some(Action::ToggleSplit), None);
        table.bind(Modifiers::LOGO | Modifiers::SHIFT, b'F' as u32, Some(Action::ToggleFloating), None);
        table.bind(Modifiers::LOGO, b'F' as u32, Some(Action::ToggleFullscreen), None);
        table.bind(Modifiers::LOGO | Modifiers::SHIFT, b'M' as u32, Some(Action::ToggleMaximized), None);
        table.bind(Modifiers::LOGO, b'B' as u32, Some(Action::SetLayoutMode(LayoutKind::Bsp)), None);
        table.bind(Modifiers::LOGO, b'M' as u32, Some(Action::SetLayoutMode(LayoutKind::Master)), None);
        table.bind(Modifiers::LOGO | Modifiers::SHIFT, b' ' as u32, Some(Action::CycleStrategy(1)), None);
    }
    for entry in &config.keybinds {
        // A real parser would turn `entry.mods`/`entry.key` into a
        // `(Modifiers, u32)` pair; left as a startup-command passthrough
        // action until the scripting host names a concrete chord syntax.
        let _ = entry;
    }
}

impl CompositorHandler for AppState {
    fn compositor_state(&mut self) -> &mut CompositorState {
        &mut self.compositor_state
    }

    fn client_compositor_state<'a>(&self, client: &'a Client) -> &'a CompositorClientState {
        &client.get_data::<ClientState>().unwrap().compositor_state
    }

    fn commit(&mut self, surface: &WlSurface) {
        smithay::backend::renderer::utils::on_commit_buffer_handler::<Self>(surface);
        self.popups.commit(surface);

        if let Some(window) = self
            .space
            .elements()
            .find(|w| w.toplevel().wl_surface() == surface)
            .cloned()
        {
            window.on_commit();

            let initial_configure_sent = with_states(surface, |states| {
                states
                    .data_map
                    .get::<XdgToplevelSurfaceData>()
                    .unwrap()
                    .lock()
                    .unwrap()
                    .initial_configure_sent
            });
            if !initial_configure_sent {
                window.toplevel().send_configure();
            }
        }
    }
}
delegate_compositor!(AppState);
delegate_output!(AppState);

impl BufferHandler for AppState {
    fn buffer_destroyed(&mut self, _buffer: &wl_buffer::WlBuffer) {}
}

impl ShmHandler for AppState {
    fn shm_state(&self) -> &ShmState {
        &self.shm_state
    }
}
delegate_shm!(AppState);

impl SeatHandler for AppState {
    type KeyboardFocus = WlSurface;
    type PointerFocus = WlSurface;
    type TouchFocus = WlSurface;

    fn seat_state(&mut self) -> &mut SeatState<Self> {
        &mut self.seat_state
    }

    fn cursor_image(&mut self, _seat: &Seat<Self>, image: CursorImageStatus) {
        self.cursor_status = image;
    }

    /// Border recoloring on focus change is the only side effect the core
    /// owns (§4.4 "focus" step-list); everything else (raise-to-top,
    /// layer-shell keyboard interactivity) is driven from the call site that
    /// decided *why* focus moved, not from this generic hook.
    fn focus_changed(&mut self, _seat: &Seat<Self>, focused: Option<&WlSurface>) {
        let focused_toplevel = focused.and_then(|surface| self.toplevel_of_surface.get(surface).copied());
        for (_, container) in self.containers.iter_mut() {
            let is_focused = focused_toplevel
                .map(|id| container.toplevels().contains(&id))
                .unwrap_or(false);
            if let Some(border) = container.border_mut() {
                border.set_focused(is_focused);
            }
        }
    }
}
delegate_seat!(AppState);

impl DataDeviceHandler for AppState {
    fn data_device_state(&self) -> &DataDeviceState {
        &self.data_device_state
    }
}
impl ClientDndGrabHandler for AppState {}
impl ServerDndGrabHandler for AppState {}
delegate_data_device!(AppState);

impl XdgShellHandler for AppState {
    fn xdg_shell_state(&mut self) -> &mut XdgShellState {
        &mut self.xdg_shell_state
    }

    /// New toplevel lifecycle (§4.8): create the `Toplevel`, decide
    /// float-vs-tile from `should_float`, place it into a fresh container on
    /// the active output/workspace, and re-run layout.
    fn new_toplevel(&mut self, surface: ToplevelSurface) {
        let window = Window::new(surface.clone());
        self.space.map_element(window, (0, 0), false);

        let toplevel = Toplevel::new_native(surface.clone());
        let should_float = toplevel.should_float();
        let toplevel_id = self.toplevels.insert(toplevel);
        self.toplevel_of_surface.insert(surface.wl_surface().clone(), toplevel_id);

        let Some(output_id) = self.active_output else {
            return;
        };
        let usable_area = self.outputs[output_id].usable_area();
        let container_id = self.spawn_container(output_id, usable_area);
        if should_float {
            self.set_container_floating(container_id, true);
        }
        self.containers[container_id].insert(toplevel_id);
        self.toplevels[toplevel_id].set_container(Some(container_id));
        self.toplevels[toplevel_id].set_mapped(true);

        self.outputs[output_id].focus_stack_mut().push_front(container_id);
        self.arrange_output(output_id);
        self.focus_surface(Some(surface.wl_surface().clone()));

        self.signals.emit("client::map", &container_id);
    }

    /// New popups are positioned per the client's requested positioner and
    /// left unconstrained at the root output boundary; nothing in the core
    /// data model tracks popups directly since they are never tileable
    /// (§4.8's toplevel-only scope; Non-goals exclude a popup layout model).
    fn new_popup(&mut self, surface: PopupSurface, _positioner: PositionerState) {
        let _ = self.popups.track_popup(smithay::desktop::PopupKind::Xdg(surface));
    }

    fn grab(&mut self, _surface: PopupSurface, _seat: wl_seat::WlSeat, _serial: Serial) {}

    fn move_request(&mut self, surface: ToplevelSurface, _seat: wl_seat::WlSeat, _serial: Serial) {
        let Some(&toplevel_id) = self.toplevel_of_surface.get(surface.wl_surface()) else {
            return;
        };
        let Some(container_id) = self.toplevels[toplevel_id].container() else {
            return;
        };
        let movable = self.containers[container_id].configure_allowed();
        let origin = self.containers[container_id].rect().loc;
        self.input_router
            .start_interactive_move(container_id, movable, self.pointer_location.to_i32_round(), origin);
    }

    fn resize_request(
        &mut self,
        surface: ToplevelSurface,
        _seat: wl_seat::WlSeat,
        _serial: Serial,
        edges: smithay::reexports::wayland_protocols::xdg::shell::server::xdg_toplevel::ResizeEdge,
    ) {
        use crate::input::router::Edges;
        use smithay::reexports::wayland_protocols::xdg::shell::server::xdg_toplevel::ResizeEdge as XdgEdge;

        let Some(&toplevel_id) = self.toplevel_of_surface.get(surface.wl_surface()) else {
            return;
        };
        let Some(container_id) = self.toplevels[toplevel_id].container() else {
            return;
        };
        let movable = self.containers[container_id].configure_allowed();
        let rect = self.containers[container_id].rect();

        let mut mapped = Edges::empty();
        match edges {
            XdgEdge::Top => mapped |= Edges::TOP,
            XdgEdge::Bottom => mapped |= Edges::BOTTOM,
            XdgEdge::Left => mapped |= Edges::LEFT,
            XdgEdge::Right => mapped |= Edges::RIGHT,
            XdgEdge::TopLeft => mapped |= Edges::TOP | Edges::LEFT,
            XdgEdge::TopRight => mapped |= Edges::TOP | Edges::RIGHT,
            XdgEdge::BottomLeft => mapped |= Edges::BOTTOM | Edges::LEFT,
            XdgEdge::BottomRight => mapped |= Edges::BOTTOM | Edges::RIGHT,
            _ => {}
        }
        self.input_router.start_interactive_resize(
            container_id,
            movable,
            mapped,
            self.pointer_location.to_i32_round(),
            rect,
        );
    }

    fn toplevel_destroyed(&mut self, surface: ToplevelSurface) {
        let Some(toplevel_id) = self.toplevel_of_surface.remove(surface.wl_surface()) else {
            return;
        };
        if let Some(window) = self
            .space
            .elements()
            .find(|w| w.toplevel().wl_surface() == surface.wl_surface())
            .cloned()
        {
            self.space.unmap_elem(&window);
        }

        let container_id = self.toplevels.get(toplevel_id).and_then(|t| t.container());
        self.toplevels.remove(toplevel_id);

        let Some(container_id) = container_id else { return };
        let output_id = self.containers[container_id].output();
        let became_empty = self.containers[container_id].remove(toplevel_id).unwrap_or(true);
        if became_empty {
            if let Some(border) = self.containers[container_id].border() {
                border.destroy(&mut self.scene);
            }
            let workspace = self.containers[container_id].workspace();
            if let Some(output) = self.outputs.get_mut(output_id) {
                output.remove_container(container_id);
                output.view_info_mut(workspace).bsp.remove(container_id).ok();
            }
            self.containers.remove(container_id);
        }
        self.signals.emit("client::unmap", &container_id);
        self.arrange_output(output_id);
    }
}
delegate_xdg_shell!(AppState);

impl XdgDecorationHandler for AppState {
    /// The core always draws its own borders (§3's `Border` row); every
    /// toplevel is forced server-side regardless of what the client asked
    /// for.
    fn new_decoration(&mut self, toplevel: ToplevelSurface) {
        use smithay::wayland::shell::xdg::decoration::xdg_toplevel_decoration::Mode;
        toplevel.with_pending_state(|state| {
            state.decoration_mode = Some(Mode::ServerSide);
        });
    }

    fn request_mode(
        &mut self,
        toplevel: ToplevelSurface,
        _mode: smithay::wayland::shell::xdg::decoration::xdg_toplevel_decoration::Mode,
    ) {
        use smithay::wayland::shell::xdg::decoration::xdg_toplevel_decoration::Mode;
        toplevel.with_pending_state(|state| {
            state.decoration_mode = Some(Mode::ServerSide);
        });
    }

    fn unset_mode(&mut self, _toplevel: ToplevelSurface) {}
}
delegate_xdg_decoration!(AppState);

impl PointerConstraintsHandler for AppState {
    /// Activates a confine/lock request only while the requesting surface
    /// already holds pointer focus (§4.4's "deactivate on surface change"
    /// implies a constraint is only ever live against the focused surface).
    /// Grounded on `other_examples/292fea07_m0ppers-buedchen__src-state.rs.rs`'s
    /// `PointerConstraintsHandler` impl, the closest real `new_constraint`
    /// this pack carries.
    fn new_constraint(&mut self, surface: &WlSurface, pointer: &PointerHandle<Self>) {
        if pointer.current_focus().as_ref() == Some(surface) {
            with_pointer_constraint(surface, pointer, |constraint| {
                if let Some(constraint) = constraint {
                    constraint.activate();
                }
            });
        }
    }
}
delegate_pointer_constraints!(AppState);

impl CursorShapeHandler for AppState {
    fn cursor_shape_manager_state(&mut self) -> &mut CursorShapeManagerState {
        &mut self.cursor_shape_manager_state
    }

    /// Applies a client's named-shape request to the seat's cursor image
    /// (§6's "cursor-shape request-set-shape"); the actual themed-image
    /// lookup for repaint happens downstream in [`crate::cursor::load_shape`].
    fn request_set_shape(
        &mut self,
        shape: smithay::reexports::wayland_protocols_wp::cursor_shape::v1::server::wp_cursor_shape_device_v1::Shape,
        _seat: Seat<Self>,
        _serial: Serial,
    ) {
        self.cursor_status = CursorImageStatus::Named(CursorIcon::from(shape));
    }
}
delegate_cursor_shape!(AppState);

delegate_virtual_keyboard_manager!(AppState);

impl WlrLayerShellHandler for AppState {
    fn shell_state(&mut self) -> &mut WlrLayerShellState {
        &mut self.layer_shell_state
    }

    /// Maps the new surface into the protocol's own `layer_map_for_output`
    /// (the real exclusive-zone bookkeeping), records it for repaint
    /// ordering, and re-derives `usable_area` (§4.5).
    fn new_layer_surface(
        &mut self,
        surface: LayerSurface,
        wl_output: Option<smithay::reexports::wayland_server::protocol::wl_output::WlOutput>,
        _layer: WlrLayer,
        _namespace: String,
    ) {
        let resolved = wl_output
            .and_then(|o| WlOutput::from_resource(&o))
            .or_else(|| self.active_output.and_then(|id| self.wl_outputs.get(&id).cloned()));
        let Some(resolved) = resolved else {
            return;
        };
        let Some((&id, target)) = self.wl_outputs.iter().find(|(_, o)| **o == resolved) else {
            return;
        };
        layer_map_for_output(target).map_layer(&surface).ok();
        self.layer_surfaces.push(MappedLayer { surface, output: id });
        self.recompute_layer_arrangement(id);
    }

    fn layer_destroyed(&mut self, surface: LayerSurface) {
        let Some(idx) = self
            .layer_surfaces
            .iter()
            .position(|l| l.surface.wl_surface() == surface.wl_surface())
        else {
            return;
        };
        let mapped = self.layer_surfaces.remove(idx);
        if let Some(wl_output) = self.wl_outputs.get(&mapped.output) {
            let mut map = layer_map_for_output(wl_output);
            map.unmap_layer(&mapped.surface);
        }
        self.recompute_layer_arrangement(mapped.output);
    }
}
delegate_layer_shell!(AppState);

impl SessionLockHandler for AppState {
    fn lock_state(&mut self) -> &mut SessionLockManagerState {
        &mut self.session_lock_state
    }

    /// Only one locker may hold the lock at a time (§4.6); a second `lock`
    /// request while already locked is ignored rather than replacing the
    /// active one.
    fn lock(&mut self, locker: SessionLocker) {
        let Some(output_id) = self.active_output else {
            return;
        };
        if self.session_lock.is_locked() {
            return;
        }
        self.session_lock.grant(output_id);
        locker.lock();
    }

    fn unlock(&mut self) {
        if let Some(output_id) = self.session_lock.release() {
            let surface = self
                .newest_focus_visible_toplevel(output_id)
                .and_then(|t| self.toplevels.get(t))
                .and_then(|t| match &t.kind {
                    ToplevelKind::Native(s) => Some(s.wl_surface().clone()),
                    ToplevelKind::Legacy => None,
                });
            self.focus_surface(surface);
        }
    }

    fn new_surface(&mut self, _surface: LockSurface, _wl_output: smithay::reexports::wayland_server::protocol::wl_output::WlOutput) {}
}
delegate_session_lock!(AppState);

impl AppState {
    /// Convenience accessor the input dispatch loop uses to reach the seat's
    /// pointer without re-deriving it from `self.seat` at every call site.
    pub fn pointer(&self) -> Option<PointerHandle<Self>> {
        self.seat.get_pointer()
    }
}
