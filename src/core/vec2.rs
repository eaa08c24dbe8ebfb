//! Fixed-Point 2D Vector
//!
//! Deterministic 2D vector for player position and velocity.
//! Screen convention: +X is right, +Y is down.

use std::fmt;
use std::ops::{Add, Sub, Neg};
use serde::{Serialize, Deserialize};

use super::fixed::{Fixed, FIXED_ONE, FIXED_SCALE, fixed_mul};

/// 2D vector with fixed-point components.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FixedVec2 {
    /// X component (Q16.16 fixed-point)
    pub x: Fixed,
    /// Y component (Q16.16 fixed-point)
    pub y: Fixed,
}

impl FixedVec2 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Create a new vector from fixed-point components.
    #[inline]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from integer pixel components.
    #[inline]
    pub const fn from_ints(x: i32, y: i32) -> Self {
        Self {
            x: x << FIXED_SCALE,
            y: y << FIXED_SCALE,
        }
    }

    /// Add another vector.
    #[inline]
    pub fn add(self, other: Self) -> Self {
        Self {
            x: self.x.wrapping_add(other.x),
            y: self.y.wrapping_add(other.y),
        }
    }

    /// Subtract another vector.
    #[inline]
    pub fn sub(self, other: Self) -> Self {
        Self {
            x: self.x.wrapping_sub(other.x),
            y: self.y.wrapping_sub(other.y),
        }
    }

    /// Scale by a fixed-point scalar.
    #[inline]
    pub fn scale(self, scalar: Fixed) -> Self {
        Self {
            x: fixed_mul(self.x, scalar),
            y: fixed_mul(self.y, scalar),
        }
    }

    /// Negate both components.
    #[inline]
    pub fn negate(self) -> Self {
        Self {
            x: self.x.wrapping_neg(),
            y: self.y.wrapping_neg(),
        }
    }

    /// Convert to float tuple for rendering.
    #[inline]
    pub fn to_floats(self) -> (f32, f32) {
        (
            self.x as f32 / FIXED_ONE as f32,
            self.y as f32 / FIXED_ONE as f32,
        )
    }
}

impl Add for FixedVec2 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        FixedVec2::add(self, rhs)
    }
}

impl Sub for FixedVec2 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        FixedVec2::sub(self, rhs)
    }
}

impl Neg for FixedVec2 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        self.negate()
    }
}

impl fmt::Debug for FixedVec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (fx, fy) = self.to_floats();
        write!(f, "Vec2({:.3}, {:.3})", fx, fy)
    }
}

impl fmt::Display for FixedVec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (fx, fy) = self.to_floats();
        write!(f, "({:.3}, {:.3})", fx, fy)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::to_fixed;

    #[test]
    fn test_vec2_from_ints() {
        let v = FixedVec2::from_ints(100, -15);
        assert_eq!(v.x, 100 * FIXED_ONE);
        assert_eq!(v.y, -15 * FIXED_ONE);
    }

    #[test]
    fn test_vec2_add_sub() {
        let a = FixedVec2::new(to_fixed(3.0), to_fixed(4.0));
        let b = FixedVec2::new(to_fixed(1.0), to_fixed(2.0));
        assert_eq!(a + b, FixedVec2::new(to_fixed(4.0), to_fixed(6.0)));
        assert_eq!(a - b, FixedVec2::new(to_fixed(2.0), to_fixed(2.0)));
        assert_eq!(-b, FixedVec2::new(to_fixed(-1.0), to_fixed(-2.0)));
    }

    #[test]
    fn test_vec2_scale() {
        let v = FixedVec2::new(to_fixed(100.0), to_fixed(780.0));
        let scaled = v.scale(to_fixed(0.5));
        assert_eq!(scaled, FixedVec2::new(to_fixed(50.0), to_fixed(390.0)));
    }

    #[test]
    fn test_vec2_to_floats() {
        let v = FixedVec2::new(to_fixed(1.5), to_fixed(-2.25));
        assert_eq!(v.to_floats(), (1.5, -2.25));
        assert_eq!(format!("{}", v), "(1.500, -2.250)");
    }
}
