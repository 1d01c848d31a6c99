//! `ext-session-lock` handling (SPEC_FULL.md §4.6).
//!
//! No teacher equivalent. Grounded directly on §4.6: a single active
//! `Locker` pins keyboard focus to the lock surface and suspends keybinding
//! dispatch while held; on unlock, focus is re-selected via
//! `newest_focus_visible_toplevel`.

use crate::ids::OutputId;

/// Which output currently owns the active lock surface, if any. The lock
/// surface handle itself is the wire-protocol resource's job to track
/// (`app.rs`); this only needs to know *whether* a lock is active and
/// *where*, since that's all the focus-pinning and dispatch-suppression
/// decisions in §4.4/§4.6 depend on.
#[derive(Default)]
pub struct SessionLock {
    locked_output: Option<OutputId>,
}

impl SessionLock {
    pub fn is_locked(&self) -> bool {
        self.locked_output.is_some()
    }

    pub fn locked_output(&self) -> Option<OutputId> {
        self.locked_output
    }

    /// Grants a lock. Only one `Locker` may be active at a time (§4.6); a
    /// second grant attempt while already locked is a protocol misuse the
    /// caller should reject before calling this (§7).
    pub fn grant(&mut self, output: OutputId) {
        self.locked_output = Some(output);
    }

    /// Releases the lock. Returns the output that was locked, if any, so
    /// the caller can run `newest_focus_visible_toplevel` against it.
    pub fn release(&mut self) -> Option<OutputId> {
        self.locked_output.take()
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

    #[test]
    fn starts_unlocked() {
        let lock = SessionLock::default();
        assert!(!lock.is_locked());
    }

    #[test]
    fn grant_then_release_round_trips_the_output() {
        let mut lock = SessionLock::default();
        let out = output_id();
        lock.grant(out);
        assert!(lock.is_locked());
        assert_eq!(lock.locked_output(), Some(out));
        assert_eq!(lock.release(), Some(out));
        assert!(!lock.is_locked());
    }
}
