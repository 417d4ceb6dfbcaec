//! Picks a turning direction and the orientation delta for this tick,
//! accounting for `turnPivotOffset` and preferring a three-point turn over
//! a long arc when the error is large enough.

use crate::fixed_math::{atan2, wrap_angle, FixedNum, FixedVec2};
use crate::interop::TurnDirection;

/// Above this angular error a reverse arc (three-point turn) is shorter
/// than turning the long way around, compared against a half-turn
/// threshold.
fn three_point_threshold() -> FixedNum {
    crate::fixed_math::pi() * FixedNum::from_num(0.6)
}

/// Returns the turning direction to take this tick and the signed angle
/// delta actually applied (clamped to `turn_rate`).
pub fn rotate_towards_position(current_orientation: FixedNum, _facing: FixedVec2, goal_direction: FixedVec2, turn_rate: FixedNum, turn_pivot_offset: FixedNum, donut_locked: bool) -> (TurnDirection, FixedNum) {
    if goal_direction.length_squared() <= FixedNum::ZERO {
        return (TurnDirection::None, FixedNum::ZERO);
    }
    let desired = atan2(goal_direction.y, goal_direction.x);
    let error = wrap_angle(desired - current_orientation);

    if error.abs() <= turn_rate {
        return (TurnDirection::None, error);
    }

    // A negative pivot offset (rear-weighted pivot) makes a tight reversal
    // cheaper, lowering the threshold at which three-point wins.
    let threshold = three_point_threshold() * (FixedNum::from_num(1) - turn_pivot_offset.abs() * FixedNum::from_num(0.25));
    if !donut_locked && error.abs() > threshold {
        let delta = turn_rate.min(error.abs()) * error.signum();
        return (TurnDirection::ThreePoint, delta);
    }

    let delta = turn_rate.min(error.abs()) * error.signum();
    let direction = if error > FixedNum::ZERO { TurnDirection::Left } else { TurnDirection::Right };
    (direction, delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_error_reports_no_turn_needed() {
        let (dir, delta) = rotate_towards_position(FixedNum::ZERO, FixedVec2::ZERO, FixedVec2::new(FixedNum::from_num(1), FixedNum::from_num(0.01)), FixedNum::from_num(0.5), FixedNum::ZERO, false);
        assert_eq!(dir, TurnDirection::None);
        assert!(delta.abs() < FixedNum::from_num(0.5));
    }

    #[test]
    fn large_reversal_prefers_three_point_turn() {
        let (dir, _) = rotate_towards_position(FixedNum::ZERO, FixedVec2::ZERO, FixedVec2::new(FixedNum::from_num(-1), FixedNum::ZERO), FixedNum::from_num(0.1), FixedNum::ZERO, false);
        assert_eq!(dir, TurnDirection::ThreePoint);
    }

    #[test]
    fn donut_lock_suppresses_three_point_turn() {
        let (dir, _) = rotate_towards_position(FixedNum::ZERO, FixedVec2::ZERO, FixedVec2::new(FixedNum::from_num(-1), FixedNum::ZERO), FixedNum::from_num(0.1), FixedNum::ZERO, true);
        assert_ne!(dir, TurnDirection::ThreePoint);
    }
}
