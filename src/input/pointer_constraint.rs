//! Pointer constraint confinement arithmetic (SPEC_FULL.md §4.4, §6).
//!
//! No teacher equivalent — `aigi`'s pointer handling (`input_handler.rs`)
//! never clips motion at all. Grounded directly on the motion-handling
//! paragraph of §4.4 and the External Interfaces' pointer-constraint
//! bullet.

use smithay::utils::{Logical, Point, Rectangle};

/// A constraint installed on a surface: confine motion to a region, or lock
/// the pointer in place entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Confined,
    Locked,
}

pub struct PointerConstraint {
    pub kind: ConstraintKind,
    /// The confinement region, in the same logical coordinate space as the
    /// cursor. Unused for `Locked`.
    pub region: Rectangle<i32, Logical>,
}

/// Applies a constraint to a proposed motion delta from `current`.
///
/// - `Locked`: motion is dropped entirely; returns `current` unchanged.
/// - `Confined`: the delta is clipped so the resulting point stays inside
///   `region` (clamped per axis, not rejected wholesale — this lets the
///   cursor slide along an edge instead of freezing the moment it touches
///   one).
pub fn apply_constraint(
    constraint: &PointerConstraint,
    current: Point<i32, Logical>,
    delta: Point<f64, Logical>,
) -> Point<i32, Logical> {
    match constraint.kind {
        ConstraintKind::Locked => current,
        ConstraintKind::Confined => {
            let proposed_x = current.x as f64 + delta.x;
            let proposed_y = current.y as f64 + delta.y;
            let region = constraint.region;
            let min_x = region.loc.x as f64;
            let max_x = (region.loc.x + region.size.w) as f64;
            let min_y = region.loc.y as f64;
            let max_y = (region.loc.y + region.size.h) as f64;
            (
                proposed_x.clamp(min_x, max_x).round() as i32,
                proposed_y.clamp(min_y, max_y).round() as i32,
            )
                .into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> Rectangle<i32, Logical> {
        Rectangle::from_loc_and_size((100, 100), (200, 200))
    }

    #[test]
    fn locked_constraint_drops_motion_entirely() {
        let constraint = PointerConstraint {
            kind: ConstraintKind::Locked,
            region: region(),
        };
        let current: Point<i32, Logical> = (150, 150).into();
        let result = apply_constraint(&constraint, current, (50.0, 50.0).into());
        assert_eq!(result, current);
    }

    #[test]
    fn confined_constraint_clamps_to_region() {
        let constraint = PointerConstraint {
            kind: ConstraintKind::Confined,
            region: region(),
        };
        let current: Point<i32, Logical> = (290, 150).into();
        let result = apply_constraint(&constraint, current, (50.0, 0.0).into());
        assert_eq!(result, (300, 150).into());
    }

    #[test]
    fn confined_constraint_allows_motion_inside_region() {
        let constraint = PointerConstraint {
            kind: ConstraintKind::Confined,
            region: region(),
        };
        let current: Point<i32, Logical> = (150, 150).into();
        let result = apply_constraint(&constraint, current, (10.0, 10.0).into());
        assert_eq!(result, (160, 160).into());
    }
}
