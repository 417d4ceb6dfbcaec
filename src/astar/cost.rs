//! Step costs, heuristic, and the penalty terms A* adds at expansion time.

pub const COST_ORTHOGONAL: u32 = 10;
pub const COST_DIAGONAL: u32 = 14;

pub const TURN_45_PENALTY: u32 = 4;
pub const TURN_90_PENALTY: u32 = 8;
pub const TURN_135_PENALTY: u32 = 16;

pub const ALLY_MOVING_PENALTY: u32 = 3 * COST_DIAGONAL;

/// Chebyshev-weighted estimate to the goal: admissible against the mix of
/// orthogonal/diagonal step costs above.
pub fn heuristic(dx: i32, dy: i32) -> u32 {
    let (dx, dy) = (dx.unsigned_abs(), dy.unsigned_abs());
    COST_ORTHOGONAL * dx.max(dy) + (COST_DIAGONAL - COST_ORTHOGONAL) * dx.min(dy)
}

/// Penalty for changing direction at `parent`, given the incoming and
/// outgoing step vectors (each in {-1,0,1}).
pub fn turn_penalty(prev_step: (i32, i32), next_step: (i32, i32)) -> u32 {
    if prev_step == next_step {
        return 0;
    }
    let dot = prev_step.0 * next_step.0 + prev_step.1 * next_step.1;
    let prev_diag = prev_step.0 != 0 && prev_step.1 != 0;
    let next_diag = next_step.0 != 0 && next_step.1 != 0;
    // dot encodes the angle between two of the eight unit directions:
    // 1 = straight continuation (handled above via equality), 0 = 45 deg
    // if one leg is diagonal, 90 deg if both orthogonal; -1 = 135 or 180.
    match dot {
        1 => 0,
        0 if prev_diag || next_diag => TURN_45_PENALTY,
        0 => TURN_90_PENALTY,
        -1 if prev_diag != next_diag => TURN_90_PENALTY,
        _ => TURN_135_PENALTY,
    }
}

/// The attack-path heuristic discount: subtracts half the weapon's range
/// so the search stops advancing once it's already within striking
/// distance instead of beelining all the way to the victim's cell.
pub fn attack_adjusted_heuristic(dx: i32, dy: i32, attack_distance: Option<u32>) -> u32 {
    let h = heuristic(dx, dy);
    match attack_distance {
        Some(d) => h.saturating_sub(d / 2),
        None => h,
    }
}
