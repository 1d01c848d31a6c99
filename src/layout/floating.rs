//! Floating layout (SPEC_FULL.md §4.3.1).
//!
//! There is nothing to compute: a floating container's `floating_box` is
//! authoritative, set directly by interactive move/resize or by whatever
//! placed it. This module exists so `layout::mod`'s dispatch has a symmetric
//! third arm next to `master` and `bsp`, matching how the teacher always
//! gave "no tiling" its own explicit branch rather than special-casing it
//! away (`aigi/src/tiling.rs`'s `TilingMode::Floating`).

/// No-op arrangement: floating containers are never touched by layout
/// dispatch. Present for symmetry with [`super::master::arrange`] and
/// [`super::bsp::BspTree::for_each_leaf`], and as the one place a future
/// "snap to grid" or "cascade new windows" policy would be grounded.
pub fn arrange() {}
