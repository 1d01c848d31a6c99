use cwc::app::{AppState, ClientState};
use cwc::cli::Cli;
use cwc::config::Config;
use cwc::logging;

use std::os::fd::AsRawFd;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use smithay::backend::input::{Event, InputEvent};
use smithay::backend::libinput::{LibinputInputBackend, LibinputSessionInterface};
use smithay::backend::session::{libseat::LibSeatSession, Session};
use smithay::output::{Mode as OutputMode, Output as WlOutput, PhysicalProperties, Subpixel};
use smithay::reexports::calloop::generic::Generic;
use smithay::reexports::calloop::timer::{TimeoutAction, Timer};
use smithay::reexports::calloop::{EventLoop, Interest, Mode as CalloopMode, PostAction};
use smithay::reexports::input::Libinput;
use smithay::reexports::wayland_server::Display;
use smithay::utils::{Rectangle, Transform};
use smithay::wayland::socket::ListeningSocketSource;

/// Everything the event loop's callbacks need: the compositor state plus
/// the raw `Display` whose socket they dispatch against. Split the same way
/// the teacher's `LoopData` is, since calloop insists on a single `Data`
/// type parameter shared by every source.
struct LoopData {
    state: AppState,
    display: Display<AppState>,
}

/// The placeholder output geometry used until a real backend (outside this
/// crate's scope — see SPEC_FULL.md §1 "rendering/allocator... owned by an
/// external integration layer, not this crate") supplies actual connector
/// modes. `aigi`'s own DRM bring-up hardcodes a similar stand-in rectangle
/// whenever no monitor is attached yet.
const DEFAULT_OUTPUT_SIZE: (i32, i32) = (1920, 1080);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_args();
    logging::init(cli.debug);

    let config = Config::load_or_default(cli.config.as_deref())?;

    let mut event_loop: EventLoop<LoopData> = EventLoop::try_new()?;
    let mut display: Display<AppState> = Display::new()?;

    let mut state = AppState::init(event_loop.handle(), &mut display, config)?;

    // Real input devices, grounded on `aigi_udev/src/backend.rs`'s session +
    // libinput bring-up. The DRM/GBM/EGL half of that file is not carried
    // forward: owning a render node and importing buffers is the external
    // renderer's job, not this crate's (§1 Non-goals, §6 External Interfaces).
    let (session, session_notifier) = LibSeatSession::new()?;
    let mut libinput_context =
        Libinput::new_with_udev::<LibinputSessionInterface<LibSeatSession>>(session.clone().into());
    libinput_context
        .udev_assign_seat(&session.seat())
        .map_err(|()| "failed to assign libinput seat")?;
    let libinput_backend = LibinputInputBackend::new(libinput_context);

    let wl_output = WlOutput::new(
        "headless-0".to_string(),
        PhysicalProperties {
            size: (0, 0).into(),
            subpixel: Subpixel::Unknown,
            make: "cwc".into(),
            model: "generic".into(),
        },
    );
    let mode = OutputMode {
        size: DEFAULT_OUTPUT_SIZE.into(),
        refresh: 60_000,
    };
    wl_output.change_current_state(Some(mode), Some(Transform::Normal), None, Some((0, 0).into()));
    wl_output.set_preferred(mode);
    let _global = wl_output.create_global::<AppState>(&display.handle());
    let full_area = Rectangle::from_loc_and_size((0, 0), DEFAULT_OUTPUT_SIZE);
    let output_id = state.add_output("headless-0".to_string(), wl_output, full_area);
    state.active_output = Some(output_id);

    let socket_notifier = ListeningSocketSource::new_auto()?;
    let socket_name = socket_notifier.socket_name().to_os_string();
    std::env::set_var("WAYLAND_DISPLAY", &socket_name);
    std::env::set_var("XCURSOR_SIZE", state.config.cursor.size.to_string());

    event_loop
        .handle()
        .insert_source(socket_notifier, |stream, _, data| {
            data.display
                .handle()
                .insert_client(stream, Arc::new(ClientState::default()))
                .expect("failed to register new client");
        })?;

    let display_notifier = Generic::new(display.backend().poll_fd().as_raw_fd(), Interest::READ, CalloopMode::Level);
    event_loop
        .handle()
        .insert_source(display_notifier, |_, _, data: &mut LoopData| {
            data.display.dispatch_clients(&mut data.state).unwrap();
            Ok(PostAction::Continue)
        })?;

    event_loop
        .handle()
        .insert_source(session_notifier, |_, _, _| {})?;

    event_loop
        .handle()
        .insert_source(libinput_backend, |event, _, data: &mut LoopData| {
            dispatch_input_event(&mut data.state, event);
        })?;

    // Replaces the DRM vblank callback the teacher drives its repaint from:
    // with no owned render loop, this crate instead ticks at the seat's
    // refresh interval purely to flush coalesced resize commits (§4.4) and
    // run `Space::refresh`'s bookkeeping.
    event_loop.handle().insert_source(
        Timer::from_duration(Duration::from_millis(8)),
        |_, _, data: &mut LoopData| {
            if let Some(output_id) = data.state.active_output {
                data.state.arrange_output(output_id);
            }
            TimeoutAction::ToDuration(Duration::from_millis(8))
        },
    )?;

    if let Some(command) = cli.startup.clone() {
        run_startup_command(&command);
    }
    for command in &state.config.startup_commands.clone() {
        run_startup_command(command);
    }

    let mut loop_data = LoopData { state, display };

    while loop_data.state.running.load(Ordering::SeqCst) {
        let result = event_loop.dispatch(Some(Duration::from_millis(16)), &mut loop_data);
        if result.is_err() {
            loop_data.state.running.store(false, Ordering::SeqCst);
        } else {
            loop_data.state.space.refresh();
            loop_data.state.popups.cleanup();
            loop_data.display.flush_clients()?;
        }
    }

    Ok(())
}

/// Spawns a detached startup command (§6 `-s`/config `startup_commands`).
/// Failures are logged, never fatal — a bad startup command should not take
/// the whole compositor down with it.
fn run_startup_command(command: &str) {
    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else { return };
    match std::process::Command::new(program).args(parts).spawn() {
        Ok(_) => tracing::info!(command, "spawned startup command"),
        Err(err) => tracing::warn!(command, %err, "failed to spawn startup command"),
    }
}

fn dispatch_input_event(
    state: &mut AppState,
    event: InputEvent<smithay::backend::libinput::LibinputInputBackend>,
) {
    use smithay::backend::input::{
        AbsolutePositionEvent, KeyState, KeyboardKeyEvent, PointerButtonEvent, PointerMotionEvent,
    };
    use smithay::input::keyboard::FilterResult;
    use smithay::input::pointer::{ButtonEvent, MotionEvent};
    use smithay::utils::SERIAL_COUNTER;

    match event {
        InputEvent::Keyboard { event } => {
            let serial = SERIAL_COUNTER.next_serial();
            let time = event.time_msec();
            let keycode = event.key_code();
            let key_state = event.state();
            let session_locked = state.session_lock.is_locked();

            let Some(keyboard) = state.seat.get_keyboard() else {
                return;
            };
            let action = keyboard.input::<cwc::app::Action, _>(
                state,
                keycode,
                key_state,
                serial,
                time,
                |state, modifiers, handle| {
                    let mods = map_modifiers(modifiers);
                    let keysym = handle.modified_sym().raw();
                    let hit = if key_state == KeyState::Pressed {
                        state.keybinds.dispatch_press(mods, keysym, session_locked)
                    } else {
                        state.keybinds.dispatch_release(mods, keysym)
                    };
                    match hit {
                        Some(action) => FilterResult::Intercept(action.clone()),
                        None => FilterResult::Forward,
                    }
                },
            );
            if let Some(action) = action {
                state.execute_action(action);
            }
        }
        InputEvent::PointerMotion { event } => {
            let Some(pointer) = state.seat.get_pointer() else {
                return;
            };
            let delta = (event.delta_x(), event.delta_y());
            let new_location = (
                state.pointer_location.x + delta.0,
                state.pointer_location.y + delta.1,
            )
                .into();
            state.pointer_location = new_location;
            if !state.handle_grab_motion(new_location.to_i32_round()) {
                let under = state
                    .space
                    .element_under(new_location)
                    .map(|(window, loc)| (window.toplevel().wl_surface().clone(), loc));
                state.focus_surface(under.as_ref().map(|(s, _)| s.clone()));
                pointer.motion(
                    state,
                    under,
                    &MotionEvent {
                        location: new_location,
                        serial: smithay::utils::SERIAL_COUNTER.next_serial(),
                        time: event.time_msec(),
                    },
                );
            }
        }
        InputEvent::PointerMotionAbsolute { event } => {
            let Some(pointer) = state.seat.get_pointer() else {
                return;
            };
            let size = DEFAULT_OUTPUT_SIZE;
            let new_location = (
                event.x_transformed(size.0 as i32),
                event.y_transformed(size.1 as i32),
            )
                .into();
            state.pointer_location = new_location;
            if !state.handle_grab_motion(new_location.to_i32_round()) {
                let under = state
                    .space
                    .element_under(new_location)
                    .map(|(window, loc)| (window.toplevel().wl_surface().clone(), loc));
                state.focus_surface(under.as_ref().map(|(s, _)| s.clone()));
                pointer.motion(
                    state,
                    under,
                    &MotionEvent {
                        location: new_location,
                        serial: smithay::utils::SERIAL_COUNTER.next_serial(),
                        time: event.time_msec(),
                    },
                );
            }
        }
        InputEvent::PointerButton { event } => {
            let Some(pointer) = state.seat.get_pointer() else {
                return;
            };
            let button_state = event.state();
            pointer.button(
                state,
                &ButtonEvent {
                    button: event.button_code(),
                    state: button_state,
                    serial: smithay::utils::SERIAL_COUNTER.next_serial(),
                    time: event.time_msec(),
                },
            );
            if button_state == smithay::backend::input::ButtonState::Released {
                state.stop_grab();
            }
        }
        _ => {}
    }
}

fn map_modifiers(modifiers: &smithay::input::keyboard::ModifiersState) -> cwc::input::keybinding::Modifiers {
    use cwc::input::keybinding::Modifiers;
    let mut out = Modifiers::empty();
    if modifiers.shift {
        out |= Modifiers::SHIFT;
    }
    if modifiers.ctrl {
        out |= Modifiers::CTRL;
    }
    if modifiers.alt {
        out |= Modifiers::ALT;
    }
    if modifiers.logo {
        out |= Modifiers::LOGO;
    }
    out
}
