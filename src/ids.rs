//! Stable-index handles for the entities that used to be reached through the
//! source's intrusive linked lists (see REDESIGN FLAGS in SPEC_FULL.md §9/§11).
//!
//! Every long-lived entity (`Output`, `Container`, `Toplevel`) lives in a
//! `slotmap` arena owned by `AppState` and is referenced everywhere else by one
//! of these newtypes, never by a raw pointer or `Rc`.

use slotmap::new_key_type;

new_key_type! {
    pub struct OutputId;
    pub struct ContainerId;
    pub struct ToplevelId;
}

/// A per-entity id handed to the scripting host so it can key its own value
/// table without holding a native pointer (§9: "object-registry" note).
pub type ScriptId = u64;
