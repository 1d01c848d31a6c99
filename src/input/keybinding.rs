//! Chorded keybinding table (SPEC_FULL.md §4.4).
//!
//! Grounded on `aigi/src/input_handler.rs::handle_input`'s keysym `if`-chain
//! (`KEY_W` → spawn weston-terminal, `KEY_V`/`KEY_O` → split toggle),
//! generalized from four hardcoded keys into a `HashMap`-backed table
//! (§9: "standard ordered/unordered map" redesign note) keyed by modifier
//! mask plus raw keysym.

use std::collections::HashMap;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const LOGO  = 0b1000;
    }
}

/// `(modifier_mask << 32) | keysym_or_button` (§4.4). The keysym is the raw,
/// untransformed one, so `Shift+1` is keyed under `1`, not `exclam` — the
/// table matches the user's "MOD+1" mental model rather than what X11/the
/// wire protocol actually delivers once Shift is applied.
pub type BindKey = u64;

pub fn bind_key(mods: Modifiers, keysym_or_button: u32) -> BindKey {
    ((mods.bits() as u64) << 32) | keysym_or_button as u64
}

pub struct Binding<A> {
    pub on_press: Option<A>,
    pub on_release: Option<A>,
}

/// The chorded bind table plus the VT-switch built-ins that are
/// re-installed whenever bindings are cleared (§4.4).
pub struct KeybindTable<A> {
    binds: HashMap<BindKey, Binding<A>>,
}

impl<A> Default for KeybindTable<A> {
    fn default() -> Self {
        let mut table = Self {
            binds: HashMap::new(),
        };
        table.install_vt_switch_builtins();
        table
    }
}

/// Keysyms `XF86Switch_VT_1..XF86Switch_VT_12`, matching the real X11
/// keysym range used by VT-switch bindings. Kept as a named range instead
/// of a magic literal because it is referenced from both installation and
/// the "reserved, do not overwrite" check in `bind`.
const VT_SWITCH_BASE_KEYSYM: u32 = 0xFFB0;

impl<A> KeybindTable<A> {
    /// Inserts the reserved `Ctrl+Alt+F1..F12` VT-switch placeholders with
    /// no action attached — a real `A` is supplied by the caller that knows
    /// how to perform a VT switch; this only reserves the chords.
    fn install_vt_switch_builtins(&mut self) {
        for i in 0..12 {
            let key = bind_key(Modifiers::CTRL | Modifiers::ALT, VT_SWITCH_BASE_KEYSYM + i);
            self.binds.entry(key).or_insert_with(|| Binding {
                on_press: None,
                on_release: None,
            });
        }
    }

    pub fn bind(&mut self, mods: Modifiers, keysym_or_button: u32, on_press: Option<A>, on_release: Option<A>) {
        self.binds
            .insert(bind_key(mods, keysym_or_button), Binding { on_press, on_release });
    }

    pub fn unbind(&mut self, mods: Modifiers, keysym_or_button: u32) {
        self.binds.remove(&bind_key(mods, keysym_or_button));
    }

    pub fn clear(&mut self) {
        self.binds.clear();
        self.install_vt_switch_builtins();
    }

    /// On key press: if `session_locked`, dispatch is suppressed entirely.
    /// Otherwise returns the matching `on_press` action, if any. The press
    /// is "consumed" (caller should not forward it to the focused client)
    /// iff this returns `Some`.
    pub fn dispatch_press(
        &self,
        mods: Modifiers,
        keysym_or_button: u32,
        session_locked: bool,
    ) -> Option<&A> {
        if session_locked {
            return None;
        }
        self.binds
            .get(&bind_key(mods, keysym_or_button))
            .and_then(|b| b.on_press.as_ref())
    }

    /// On key release: dispatch is always attempted regardless of lock
    /// state, but the release is always forwarded to the focused client too
    /// (§4.4) — that forwarding is the caller's responsibility, not this
    /// table's.
    pub fn dispatch_release(&self, mods: Modifiers, keysym_or_button: u32) -> Option<&A> {
        self.binds
            .get(&bind_key(mods, keysym_or_button))
            .and_then(|b| b.on_release.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_plus_one_is_keyed_under_the_raw_digit() {
        let mut table: KeybindTable<&'static str> = KeybindTable::default();
        table.bind(Modifiers::SHIFT, b'1' as u32, Some("bang"), None);
        assert_eq!(
            table.dispatch_press(Modifiers::SHIFT, b'1' as u32, false),
            Some(&"bang")
        );
    }

    #[test]
    fn session_lock_suppresses_press_dispatch() {
        let mut table: KeybindTable<&'static str> = KeybindTable::default();
        table.bind(Modifiers::ALT, b'T' as u32, Some("term"), None);
        assert_eq!(table.dispatch_press(Modifiers::ALT, b'T' as u32, true), None);
        assert_eq!(
            table.dispatch_press(Modifiers::ALT, b'T' as u32, false),
            Some(&"term")
        );
    }

    #[test]
    fn release_dispatch_ignores_lock_state() {
        let mut table: KeybindTable<&'static str> = KeybindTable::default();
        table.bind(Modifiers::ALT, b'T' as u32, None, Some("term-release"));
        assert_eq!(
            table.dispatch_release(Modifiers::ALT, b'T' as u32),
            Some(&"term-release")
        );
    }

    #[test]
    fn vt_switch_builtins_survive_clear() {
        let mut table: KeybindTable<&'static str> = KeybindTable::default();
        let vt1_key = bind_key(Modifiers::CTRL | Modifiers::ALT, VT_SWITCH_BASE_KEYSYM);
        assert!(table.binds.contains_key(&vt1_key));
        table.bind(Modifiers::LOGO, b'Q' as u32, Some("quit"), None);
        table.clear();
        assert!(table.binds.contains_key(&vt1_key));
        assert!(table.dispatch_press(Modifiers::LOGO, b'Q' as u32, false).is_none());
    }
}
