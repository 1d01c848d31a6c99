//! Master/stack layout (SPEC_FULL.md §4.3.2).
//!
//! Generalizes `aigi_first/src/state.rs::new_toplevel`'s ad hoc "divide the
//! output height by the window count" into a real master/stack split with a
//! registered-strategy ring (REDESIGN FLAGS §11 replaces the teacher's
//! sentinel-based circular list with a plain indexed `Vec` + cursor).
//!
//! Layout code never touches toplevel surfaces directly — it only calls
//! [`Tileable::set_size`]/[`Tileable::set_position_gap`], the same boundary
//! `Container` enforces in §4.1. The trait exists so this module doesn't
//! need to depend on `crate::container` (kept decoupled, the way `scene.rs`'s
//! `SceneBackend` keeps layout decoupled from rendering).

use smithay::utils::{Logical, Point, Rectangle, Size};

/// Anything a master/stack strategy can arrange. `Container` is the only
/// real implementor; tests use a minimal fake.
pub trait Tileable {
    fn set_size(&mut self, size: Size<i32, Logical>);
    fn set_position_gap(&mut self, point: Point<i32, Logical>, gap: u32);
}

/// One registered arrangement algorithm.
pub type Strategy = fn(&mut [&mut dyn Tileable], Rectangle<i32, Logical>, f64, u32, u32);

/// The circular strategy ring addressed by index (SPEC_FULL.md §4.3.2,
/// REDESIGN FLAGS §11). `master_count`/`column_count`/`mwfact` live on
/// `MasterState` in `tag.rs`; this registry only resolves the index to a
/// function pointer and steps the cursor.
pub struct StrategyRing {
    strategies: Vec<Strategy>,
}

impl Default for StrategyRing {
    fn default() -> Self {
        Self {
            strategies: vec![tile, monocle, fullscreen],
        }
    }
}

impl StrategyRing {
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Wraps `idx` into range rather than panicking — a strategy removed
    /// from underneath a stale index should degrade to `tile`, not crash.
    pub fn get(&self, idx: usize) -> Strategy {
        if self.strategies.is_empty() {
            return tile;
        }
        self.strategies[idx % self.strategies.len()]
    }

    pub fn next_idx(&self, idx: usize) -> usize {
        if self.strategies.is_empty() {
            0
        } else {
            (idx + 1) % self.strategies.len()
        }
    }

    pub fn prev_idx(&self, idx: usize) -> usize {
        if self.strategies.is_empty() {
            0
        } else {
            (idx + self.strategies.len() - 1) % self.strategies.len()
        }
    }
}

/// Arranges `containers` (already filtered to visible, tileable containers
/// in stacking order) within `usable_area` using strategy `idx` from `ring`.
pub fn arrange(
    ring: &StrategyRing,
    idx: usize,
    containers: &mut [&mut dyn Tileable],
    usable_area: Rectangle<i32, Logical>,
    mwfact: f64,
    gap: u32,
    master_count: u32,
) {
    (ring.get(idx))(containers, usable_area, mwfact, gap, master_count);
}

/// Shrinks `size` by `gap` on every side, clamped so it never goes negative.
/// `set_position_gap` only offsets a container's position by the gap — the
/// matching shrink has to be folded into the size a strategy passes to
/// `set_size` itself.
fn inset(size: Size<i32, Logical>, gap: u32) -> Size<i32, Logical> {
    let gap = gap as i32;
    ((size.w - 2 * gap).max(0), (size.h - 2 * gap).max(0)).into()
}

/// Master column + equal-height stack rows, the last absorbing the rounding
/// remainder.
fn tile(
    containers: &mut [&mut dyn Tileable],
    usable: Rectangle<i32, Logical>,
    mwfact: f64,
    gap: u32,
    master_count: u32,
) {
    let n = containers.len();
    if n == 0 {
        return;
    }
    if n == 1 {
        containers[0].set_size(inset(usable.size, gap));
        containers[0].set_position_gap(usable.loc, gap);
        return;
    }

    let master_count = (master_count as usize).clamp(1, n - 1).max(1);
    let master_w = ((usable.size.w as f64) * mwfact).floor() as i32;
    let stack_w = usable.size.w - master_w;

    let master_h = usable.size.h / master_count as i32;
    for (i, c) in containers[..master_count].iter_mut().enumerate() {
        let y = usable.loc.y + master_h * i as i32;
        let h = if i + 1 == master_count {
            usable.size.h - master_h * (master_count as i32 - 1)
        } else {
            master_h
        };
        c.set_size(inset((master_w, h).into(), gap));
        c.set_position_gap((usable.loc.x, y).into(), gap);
    }

    let stack = &mut containers[master_count..];
    let stack_n = stack.len();
    let stack_h = usable.size.h / stack_n as i32;
    let stack_x = usable.loc.x + master_w;
    for (i, c) in stack.iter_mut().enumerate() {
        let y = usable.loc.y + stack_h * i as i32;
        let h = if i + 1 == stack_n {
            usable.size.h - stack_h * (stack_n as i32 - 1)
        } else {
            stack_h
        };
        c.set_size(inset((stack_w, h).into(), gap));
        c.set_position_gap((stack_x, y).into(), gap);
    }
}

/// Every container fills the usable area.
fn monocle(
    containers: &mut [&mut dyn Tileable],
    usable: Rectangle<i32, Logical>,
    _mwfact: f64,
    gap: u32,
    _master_count: u32,
) {
    for c in containers.iter_mut() {
        c.set_size(inset(usable.size, gap));
        c.set_position_gap(usable.loc, gap);
    }
}

/// Like `monocle` but ignores gaps and fills the whole output, not just the
/// usable area. Callers are expected to pass the output's full rect as
/// `usable` for this strategy; it is still keyed through the same signature
/// so it can sit in the same strategy ring.
fn fullscreen(
    containers: &mut [&mut dyn Tileable],
    usable: Rectangle<i32, Logical>,
    _mwfact: f64,
    _gap: u32,
    _master_count: u32,
) {
    for c in containers.iter_mut() {
        c.set_position_gap(usable.loc, 0);
        c.set_size(usable.size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq, Clone, Copy)]
    struct FakeTile {
        pos: Point<i32, Logical>,
        size: Size<i32, Logical>,
    }

    impl Tileable for FakeTile {
        fn set_size(&mut self, size: Size<i32, Logical>) {
            self.size = size;
        }
        fn set_position_gap(&mut self, point: Point<i32, Logical>, _gap: u32) {
            self.pos = point;
        }
    }

    fn usable() -> Rectangle<i32, Logical> {
        Rectangle::from_loc_and_size((0, 0), (1600, 900))
    }

    #[test]
    fn tile_single_container_fills_usable_area() {
        let mut a = FakeTile::default();
        let mut refs: Vec<&mut dyn Tileable> = vec![&mut a];
        tile(&mut refs, usable(), 0.5, 0, 1);
        assert_eq!(a.pos, (0, 0).into());
        assert_eq!(a.size, (1600, 900).into());
    }

    #[test]
    fn tile_splits_master_and_stack_per_mwfact() {
        let mut a = FakeTile::default();
        let mut b = FakeTile::default();
        let mut c = FakeTile::default();
        {
            let mut refs: Vec<&mut dyn Tileable> = vec![&mut a, &mut b, &mut c];
            tile(&mut refs, usable(), 0.5, 0, 1);
        }
        assert_eq!(a.pos, (0, 0).into());
        assert_eq!(a.size, (800, 900).into());
        assert_eq!(b.pos, (800, 0).into());
        assert_eq!(b.size, (800, 450).into());
        assert_eq!(c.pos, (800, 450).into());
        assert_eq!(c.size, (800, 450).into());
    }

    #[test]
    fn monocle_fills_usable_area_for_every_container() {
        let mut a = FakeTile::default();
        let mut b = FakeTile::default();
        let mut refs: Vec<&mut dyn Tileable> = vec![&mut a, &mut b];
        monocle(&mut refs, usable(), 0.5, 0, 1);
        assert_eq!(a.size, (1600, 900).into());
        assert_eq!(b.pos, (0, 0).into());
    }

    #[test]
    fn monocle_insets_every_container_by_the_gap() {
        let mut a = FakeTile::default();
        let mut refs: Vec<&mut dyn Tileable> = vec![&mut a];
        monocle(&mut refs, usable(), 0.5, 8, 1);
        assert_eq!(a.size, (1584, 884).into());
        assert_eq!(a.pos, (8, 8).into());
    }

    #[test]
    fn tile_single_container_insets_by_the_gap() {
        let mut a = FakeTile::default();
        let mut refs: Vec<&mut dyn Tileable> = vec![&mut a];
        tile(&mut refs, usable(), 0.5, 10, 1);
        assert_eq!(a.size, (1580, 880).into());
        assert_eq!(a.pos, (10, 10).into());
    }

    #[test]
    fn ring_wraps_around_in_both_directions() {
        let ring = StrategyRing::default();
        let last = ring.len() - 1;
        assert_eq!(ring.next_idx(last), 0);
        assert_eq!(ring.prev_idx(0), last);
    }
}
