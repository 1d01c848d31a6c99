//! Tags, workspaces, and the per-workspace view configuration
//! (SPEC_FULL.md §3, §4.2).
//!
//! Grounded loosely on `aigi/src/tiling.rs`'s `Split` enum — that file only
//! ever tracked one split axis for the whole tree; here it is generalized
//! into the full `ViewInfo` (layout kind, gap, master parameters, BSP root)
//! the spec's data model calls for.

use serde::{Deserialize, Serialize};

use crate::error::TagError;
use crate::layout::bsp::BspTree;

pub const MAX_WORKSPACE: u8 = 30;

/// A set of up to 30 tag bits, one per workspace index (bit `w - 1`
/// corresponds to workspace `w`). Plain `u32` rather than `bitflags!` because
/// the bit positions are data (workspace indices), not a fixed enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TagBitfield(pub u32);

impl TagBitfield {
    pub const EMPTY: TagBitfield = TagBitfield(0);

    /// The bitfield with only workspace `w`'s bit set. `w` must be in
    /// `[1, MAX_WORKSPACE]`.
    pub fn single(w: u8) -> Result<TagBitfield, TagError> {
        if w == 0 || w > MAX_WORKSPACE {
            return Err(TagError::TagOutOfRange(w));
        }
        Ok(TagBitfield(1u32 << (w - 1)))
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: TagBitfield) -> bool {
        self.0 & other.0 != 0
    }

    pub fn union(self, other: TagBitfield) -> TagBitfield {
        TagBitfield(self.0 | other.0)
    }

    pub fn toggled(self, w: u8) -> Result<TagBitfield, TagError> {
        let bit = TagBitfield::single(w)?;
        Ok(TagBitfield(self.0 ^ bit.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutKind {
    Floating,
    Master,
    Bsp,
}

/// Parameters of the master/stack layout (SPEC_FULL.md §4.3.2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterState {
    /// Number of containers kept in the master column(s) before the rest
    /// spill into the stack area.
    pub master_count: u32,
    /// Number of columns the stack area is split into.
    pub column_count: u32,
    /// Fraction of usable width given to the master area, clamped to
    /// `[0.1, 0.9]`.
    pub mwfact: f64,
    /// Index into the registered strategy list (`tile`, `monocle`, ...).
    pub strategy_idx: usize,
}

impl Default for MasterState {
    fn default() -> Self {
        Self {
            master_count: 1,
            column_count: 1,
            mwfact: 0.5,
            strategy_idx: 0,
        }
    }
}

impl MasterState {
    pub fn set_mwfact(&mut self, f: f64) {
        self.mwfact = f.clamp(0.1, 0.9);
    }
}

/// Per-workspace-per-output view configuration (SPEC_FULL.md §3's `ViewInfo`
/// row). Every `Output` owns 30 of these, indexed `1..=30`.
#[derive(Debug, Clone)]
pub struct ViewInfo {
    pub layout_kind: LayoutKind,
    pub gap: u32,
    pub master: MasterState,
    pub bsp: BspTree,
}

impl Default for ViewInfo {
    fn default() -> Self {
        Self {
            layout_kind: LayoutKind::Master,
            gap: 0,
            master: MasterState::default(),
            bsp: BspTree::default(),
        }
    }
}

impl ViewInfo {
    pub fn set_gap(&mut self, gap: u32) {
        self.gap = gap;
    }

    pub fn set_mwfact(&mut self, f: f64) {
        self.master.set_mwfact(f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_sets_exactly_one_bit() {
        let t = TagBitfield::single(1).unwrap();
        assert_eq!(t.0, 0b1);
        let t = TagBitfield::single(30).unwrap();
        assert_eq!(t.0, 1 << 29);
    }

    #[test]
    fn out_of_range_workspace_is_an_error() {
        assert!(TagBitfield::single(0).is_err());
        assert!(TagBitfield::single(31).is_err());
    }

    #[test]
    fn toggle_twice_is_identity() {
        let start = TagBitfield::single(3).unwrap();
        let once = start.toggled(5).unwrap();
        let twice = once.toggled(5).unwrap();
        assert_eq!(start, twice);
    }

    #[test]
    fn union_combines_bits() {
        let a = TagBitfield::single(1).unwrap();
        let b = TagBitfield::single(2).unwrap();
        let u = a.union(b);
        assert!(u.contains(a));
        assert!(u.contains(b));
    }

    #[test]
    fn mwfact_clamps_to_valid_range() {
        let mut m = MasterState::default();
        m.set_mwfact(0.0);
        assert_eq!(m.mwfact, 0.1);
        m.set_mwfact(1.0);
        assert_eq!(m.mwfact, 0.9);
        m.set_mwfact(0.6);
        assert_eq!(m.mwfact, 0.6);
    }
}
