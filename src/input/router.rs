//! Cursor state machine, resize coalescing, and focus policy (SPEC_FULL.md
//! §4.4).
//!
//! Grounded on `aigi/src/input_handler.rs`/`aigi_udev/src/input_handler.rs`'s
//! `handle_input` (keyboard `FilterResult` dispatch, pointer motion with
//! `element_under`/`set_focus`/`pointer.motion`), generalized from a
//! hardcoded four-key handler into the full grab state machine, edge
//! inference, and resize-rate coalescing the teacher never implemented.
//! Expressed against plain geometry so the decision logic is unit-testable
//! without a seat; `app.rs` is the thin layer that actually calls into
//! `smithay::input`.

use std::time::{Duration, Instant};

use bitflags::bitflags;
use smithay::utils::{Logical, Point, Rectangle};

use crate::ids::ContainerId;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Edges: u8 {
        const TOP    = 0b0001;
        const BOTTOM = 0b0010;
        const LEFT   = 0b0100;
        const RIGHT  = 0b1000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Normal,
    Move {
        container: ContainerId,
        /// `cursor - container.origin` at grab start.
        grab_offset: Point<i32, Logical>,
    },
    Resize {
        container: ContainerId,
        edges: Edges,
        initial_rect: Rectangle<i32, Logical>,
        grab_start: Point<i32, Logical>,
    },
}

/// Single-edge regions are `|n| <= 0.3` on the primary axis with the
/// perpendicular axis's normalized coordinate in `(0.4, 1]` (§4.4); outside
/// that band, a corner pair is inferred from the signs of both axes.
fn infer_edges_from_ndc(nx: f64, ny: f64) -> Edges {
    let primary_edge = |n: f64| n.abs() <= 0.3;
    let perpendicular_in_band = |n: f64| (0.4..=1.0).contains(&n.abs());

    let near_vertical_edge = primary_edge(nx) && perpendicular_in_band(ny);
    let near_horizontal_edge = primary_edge(ny) && perpendicular_in_band(nx);

    match (near_vertical_edge, near_horizontal_edge) {
        (true, false) => {
            if nx < 0.0 {
                Edges::LEFT
            } else {
                Edges::RIGHT
            }
        }
        (false, true) => {
            if ny < 0.0 {
                Edges::TOP
            } else {
                Edges::BOTTOM
            }
        }
        _ => {
            let mut edges = Edges::empty();
            edges |= if nx < 0.0 { Edges::LEFT } else { Edges::RIGHT };
            edges |= if ny < 0.0 { Edges::TOP } else { Edges::BOTTOM };
            edges
        }
    }
}

/// Maps a pointer position within a toplevel's geometry box to `[-1,1]^2`
/// with `(0,0)` at the center (§6 "Geometry conventions").
pub fn to_normalized_device_coords(
    point: Point<i32, Logical>,
    geometry: Rectangle<i32, Logical>,
) -> (f64, f64) {
    let rel_x = (point.x - geometry.loc.x) as f64;
    let rel_y = (point.y - geometry.loc.y) as f64;
    let half_w = geometry.size.w as f64 / 2.0;
    let half_h = geometry.size.h as f64 / 2.0;
    if half_w == 0.0 || half_h == 0.0 {
        return (0.0, 0.0);
    }
    ((rel_x - half_w) / half_w, (rel_y - half_h) / half_h)
}

pub struct InputRouter {
    state: CursorState,
    pending_resize: Option<Rectangle<i32, Logical>>,
    last_resize_commit: Option<Instant>,
    refresh_interval: Duration,
}

impl Default for InputRouter {
    fn default() -> Self {
        Self {
            state: CursorState::Normal,
            pending_resize: None,
            last_resize_commit: None,
            // 1000/Hz when known; default 8ms when unknown (§4.4).
            refresh_interval: Duration::from_millis(8),
        }
    }
}

impl InputRouter {
    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn set_refresh_rate_hz(&mut self, hz: u32) {
        if hz > 0 {
            self.refresh_interval = Duration::from_millis(1000 / hz as u64);
        }
    }

    /// `Normal -> Move` iff `movable` (§4.4: floating, not
    /// fullscreen/maximized/unmanaged). No-op otherwise.
    pub fn start_interactive_move(
        &mut self,
        container: ContainerId,
        movable: bool,
        cursor: Point<i32, Logical>,
        container_origin: Point<i32, Logical>,
    ) {
        if !movable || !matches!(self.state, CursorState::Normal) {
            return;
        }
        self.state = CursorState::Move {
            container,
            grab_offset: (cursor.x - container_origin.x, cursor.y - container_origin.y).into(),
        };
    }

    /// `Normal -> Resize(edges)` iff `movable`. If `edges` is empty, it is
    /// inferred from `cursor`'s position within `geometry` (§4.4).
    pub fn start_interactive_resize(
        &mut self,
        container: ContainerId,
        movable: bool,
        edges: Edges,
        cursor: Point<i32, Logical>,
        geometry: Rectangle<i32, Logical>,
    ) {
        if !movable || !matches!(self.state, CursorState::Normal) {
            return;
        }
        let edges = if edges.is_empty() {
            let (nx, ny) = to_normalized_device_coords(cursor, geometry);
            infer_edges_from_ndc(nx, ny)
        } else {
            edges
        };
        self.state = CursorState::Resize {
            container,
            edges,
            initial_rect: geometry,
            grab_start: cursor,
        };
    }

    /// Any state -> `Normal`. If a resize had a pending scheduled rect, it
    /// is returned so the caller can apply the final configure.
    pub fn stop_interactive(&mut self) -> Option<Rectangle<i32, Logical>> {
        self.state = CursorState::Normal;
        self.pending_resize.take()
    }

    /// Applies a Move-state motion: `container.set_position(cursor - grab)`.
    /// Returns `None` if not currently in Move.
    pub fn handle_move_motion(&self, cursor: Point<i32, Logical>) -> Option<Point<i32, Logical>> {
        match self.state {
            CursorState::Move { grab_offset, .. } => {
                Some((cursor.x - grab_offset.x, cursor.y - grab_offset.y).into())
            }
            _ => None,
        }
    }

    /// Derives a candidate rect from cursor position + initial geometry +
    /// edges, enforcing `left < right` and `top < bottom` with a 1px
    /// minimum (§4.4), then coalesces it through [`Self::schedule_resize`].
    /// Returns `Some(rect)` only on ticks where the coalescing window says
    /// to actually commit.
    pub fn handle_resize_motion(&mut self, cursor: Point<i32, Logical>) -> Option<Rectangle<i32, Logical>> {
        let (edges, initial_rect, grab_start) = match self.state {
            CursorState::Resize {
                edges,
                initial_rect,
                grab_start,
                ..
            } => (edges, initial_rect, grab_start),
            _ => return None,
        };

        let dx = cursor.x - grab_start.x;
        let dy = cursor.y - grab_start.y;

        let mut left = initial_rect.loc.x;
        let mut top = initial_rect.loc.y;
        let mut right = initial_rect.loc.x + initial_rect.size.w;
        let mut bottom = initial_rect.loc.y + initial_rect.size.h;

        if edges.contains(Edges::LEFT) {
            left += dx;
        }
        if edges.contains(Edges::RIGHT) {
            right += dx;
        }
        if edges.contains(Edges::TOP) {
            top += dy;
        }
        if edges.contains(Edges::BOTTOM) {
            bottom += dy;
        }

        if right - left < 1 {
            right = left + 1;
        }
        if bottom - top < 1 {
            bottom = top + 1;
        }

        let candidate = Rectangle::from_loc_and_size((left, top), (right - left, bottom - top));
        self.schedule_resize(candidate)
    }

    /// Coalesces to one configure per `refresh_interval`. Between scheduled
    /// commits the candidate rect is just remembered; `stop_interactive`
    /// flushes whatever is left pending.
    fn schedule_resize(&mut self, candidate: Rectangle<i32, Logical>) -> Option<Rectangle<i32, Logical>> {
        self.pending_resize = Some(candidate);
        let now_to_commit = match self.last_resize_commit {
            None => true,
            Some(last) => Instant::now().saturating_duration_since(last) >= self.refresh_interval,
        };
        if now_to_commit {
            self.last_resize_commit = Some(Instant::now());
            self.pending_resize.take()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid() -> ContainerId {
        let mut map: slotmap::SlotMap<ContainerId, ()> = slotmap::SlotMap::with_key();
        map.insert(())
    }

    #[test]
    fn move_requires_movable() {
        let mut router = InputRouter::default();
        router.start_interactive_move(cid(), false, (0, 0).into(), (0, 0).into());
        assert_eq!(router.state(), CursorState::Normal);
    }

    #[test]
    fn move_motion_tracks_grab_offset() {
        let mut router = InputRouter::default();
        let c = cid();
        router.start_interactive_move(c, true, (110, 60).into(), (100, 50).into());
        let new_pos = router.handle_move_motion((150, 90).into()).unwrap();
        assert_eq!(new_pos, (140, 80).into());
    }

    #[test]
    fn stop_interactive_returns_to_normal() {
        let mut router = InputRouter::default();
        router.start_interactive_move(cid(), true, (0, 0).into(), (0, 0).into());
        assert!(router.stop_interactive().is_none());
        assert_eq!(router.state(), CursorState::Normal);
    }

    #[test]
    fn edge_inference_picks_single_edge_near_midline() {
        // right edge: nx near 1, ny near center
        assert_eq!(infer_edges_from_ndc(0.95, 0.0), Edges::RIGHT);
        assert_eq!(infer_edges_from_ndc(-0.95, 0.0), Edges::LEFT);
        assert_eq!(infer_edges_from_ndc(0.0, 0.95), Edges::BOTTOM);
        assert_eq!(infer_edges_from_ndc(0.0, -0.95), Edges::TOP);
    }

    #[test]
    fn edge_inference_picks_corner_away_from_midlines() {
        assert_eq!(infer_edges_from_ndc(0.9, 0.9), Edges::BOTTOM | Edges::RIGHT);
        assert_eq!(infer_edges_from_ndc(-0.9, -0.9), Edges::TOP | Edges::LEFT);
    }

    #[test]
    fn resize_enforces_one_pixel_minimum_size() {
        let mut router = InputRouter::default();
        let c = cid();
        let geo = Rectangle::from_loc_and_size((0, 0), (200, 200));
        router.start_interactive_resize(c, true, Edges::RIGHT, (200, 100).into(), geo);
        let candidate = router.handle_resize_motion((-500, 100).into()).unwrap();
        assert!(candidate.size.w >= 1);
    }

    #[test]
    fn resize_coalesces_rapid_motion_into_one_commit() {
        let mut router = InputRouter::default();
        let c = cid();
        let geo = Rectangle::from_loc_and_size((0, 0), (200, 200));
        router.start_interactive_resize(c, true, Edges::RIGHT, (200, 100).into(), geo);
        let first = router.handle_resize_motion((210, 100).into());
        assert!(first.is_some());
        let second = router.handle_resize_motion((220, 100).into());
        assert!(second.is_none());
    }
}
