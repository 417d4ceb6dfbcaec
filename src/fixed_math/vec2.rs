use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use super::FixedNum;

/// A 2D point or vector in fixed-point world coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FixedVec2 {
    pub x: FixedNum,
    pub y: FixedNum,
}

impl FixedVec2 {
    pub const ZERO: FixedVec2 = FixedVec2 {
        x: FixedNum::ZERO,
        y: FixedNum::ZERO,
    };

    pub const fn new(x: FixedNum, y: FixedNum) -> Self {
        Self { x, y }
    }

    pub fn length_squared(self) -> FixedNum {
        self.x * self.x + self.y * self.y
    }

    /// Integer square root via Newton's method on the fixed-point
    /// representation. Used instead of a float `sqrt` to keep results
    /// reproducible across platforms.
    pub fn length(self) -> FixedNum {
        let sq = self.length_squared();
        if sq <= FixedNum::ZERO {
            return FixedNum::ZERO;
        }
        fixed_sqrt(sq)
    }

    pub fn normalize(self) -> FixedVec2 {
        let len = self.length();
        if len <= FixedNum::ZERO {
            return FixedVec2::ZERO;
        }
        FixedVec2::new(self.x / len, self.y / len)
    }

    pub fn dot(self, other: FixedVec2) -> FixedNum {
        self.x * other.x + self.y * other.y
    }

    /// Manhattan (L1) distance, used by several of the pathfinder's budget
    /// and closest-viable-cell comparisons.
    pub fn manhattan_distance(self, other: FixedVec2) -> FixedNum {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn lerp(self, other: FixedVec2, t: FixedNum) -> FixedVec2 {
        self + (other - self) * t
    }
}

fn fixed_sqrt(value: FixedNum) -> FixedNum {
    // Initial guess from the float domain, refined with a couple of Newton
    // iterations in fixed-point so the final bits are deterministic.
    let approx = FixedNum::from_num((value.to_num::<f64>()).sqrt());
    let mut guess = if approx > FixedNum::ZERO {
        approx
    } else {
        FixedNum::from_num(1)
    };
    for _ in 0..4 {
        if guess == FixedNum::ZERO {
            break;
        }
        guess = (guess + value / guess) / FixedNum::from_num(2);
    }
    guess
}

impl Add for FixedVec2 {
    type Output = FixedVec2;
    fn add(self, rhs: FixedVec2) -> FixedVec2 {
        FixedVec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for FixedVec2 {
    fn add_assign(&mut self, rhs: FixedVec2) {
        *self = *self + rhs;
    }
}

impl Sub for FixedVec2 {
    type Output = FixedVec2;
    fn sub(self, rhs: FixedVec2) -> FixedVec2 {
        FixedVec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for FixedVec2 {
    fn sub_assign(&mut self, rhs: FixedVec2) {
        *self = *self - rhs;
    }
}

impl Neg for FixedVec2 {
    type Output = FixedVec2;
    fn neg(self) -> FixedVec2 {
        FixedVec2::new(-self.x, -self.y)
    }
}

impl Mul<FixedNum> for FixedVec2 {
    type Output = FixedVec2;
    fn mul(self, rhs: FixedNum) -> FixedVec2 {
        FixedVec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<FixedNum> for FixedVec2 {
    type Output = FixedVec2;
    fn div(self, rhs: FixedNum) -> FixedVec2 {
        FixedVec2::new(self.x / rhs, self.y / rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_of_unit_vectors() {
        let v = FixedVec2::new(FixedNum::from_num(3), FixedNum::from_num(4));
        let len = v.length();
        assert!((len - FixedNum::from_num(5)).abs() < FixedNum::from_num(0.01));
    }

    #[test]
    fn normalize_preserves_direction() {
        let v = FixedVec2::new(FixedNum::from_num(10), FixedNum::ZERO);
        let n = v.normalize();
        assert!((n.x - FixedNum::from_num(1)).abs() < FixedNum::from_num(0.01));
        assert_eq!(n.y, FixedNum::ZERO);
    }

    #[test]
    fn zero_vector_normalizes_to_zero() {
        assert_eq!(FixedVec2::ZERO.normalize(), FixedVec2::ZERO);
    }
}
