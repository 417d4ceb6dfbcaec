//! Trigonometry for the locomotor's turn model. Bridged through `f64` the
//! same way `FixedVec2::length`'s Newton seed is (see `vec2.rs`): the libm
//! call itself isn't exact fixed-point arithmetic, but it's the same call
//! on every platform running the same binary, which is all the turn model
//! needs — orientation only ever feeds a left/right/none decision and a
//! clamped per-tick step, not a replayed bit-exact trajectory.

use super::FixedNum;

pub fn pi() -> FixedNum {
    FixedNum::from_num(core::f64::consts::PI)
}

pub fn tau() -> FixedNum {
    FixedNum::from_num(core::f64::consts::TAU)
}

pub fn sin(angle: FixedNum) -> FixedNum {
    FixedNum::from_num(angle.to_num::<f64>().sin())
}

pub fn cos(angle: FixedNum) -> FixedNum {
    FixedNum::from_num(angle.to_num::<f64>().cos())
}

pub fn atan2(y: FixedNum, x: FixedNum) -> FixedNum {
    FixedNum::from_num(y.to_num::<f64>().atan2(x.to_num::<f64>()))
}

/// Normalize an angle into `(-pi, pi]`.
pub fn wrap_angle(angle: FixedNum) -> FixedNum {
    let (pi, tau) = (pi(), tau());
    let mut a = angle;
    while a > pi {
        a -= tau;
    }
    while a <= -pi {
        a += tau;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atan2_recovers_cardinal_directions() {
        let east = atan2(FixedNum::ZERO, FixedNum::from_num(1));
        assert!(east.abs() < FixedNum::from_num(0.01));
        let north = atan2(FixedNum::from_num(1), FixedNum::ZERO);
        assert!((north - pi() / FixedNum::from_num(2)).abs() < FixedNum::from_num(0.01));
    }

    #[test]
    fn wrap_angle_keeps_result_in_range() {
        let wrapped = wrap_angle(pi() * FixedNum::from_num(3));
        assert!(wrapped > -pi() && wrapped <= pi());
    }
}
