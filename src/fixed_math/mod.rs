//! Deterministic fixed-point mathematics.
//!
//! All cost arithmetic and world-space coordinates in the pathfinding core use
//! fixed-point numbers rather than floats, so that two machines stepping the
//! same sequence of ticks reach bit-identical results.

use fixed::types::I48F16;

mod trig;
mod vec2;

pub use trig::{atan2, cos, pi, sin, tau, wrap_angle};
pub use vec2::FixedVec2;

/// Fixed-point scalar used throughout the core.
///
/// I48F16: 48 integer bits, 16 fractional bits. Range ~±140 trillion with a
/// precision of about 1/65536 of a world unit.
pub type FixedNum = I48F16;
