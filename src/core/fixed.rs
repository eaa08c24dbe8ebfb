//! Q16.16 Fixed-Point Arithmetic
//!
//! Deterministic fixed-point math for the platformer simulation.
//! All tick-loop operations use integer arithmetic only - no floats in physics.
//!
//! ## Format: Q16.16
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Bit Layout: Q16.16 (32-bit signed integer)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  [S][IIIIIIIIIIIIIIII][FFFFFFFFFFFFFFFF]                    │
//! │   │  └──── 16 bits ────┘└──── 16 bits ────┘                 │
//! │   └─ Sign bit                                               │
//! │                                                             │
//! │  Range: -32768.0 to +32767.99998 px (approx)                │
//! │  Precision: 1/65536 ≈ 0.000015 px                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! One unit is one screen pixel at scale 1.0. Every physics constant is a
//! per-tick delta, so the simulated speed follows the tick cadence.

/// Q16.16 fixed-point number stored as i32.
/// 16 bits integer, 16 bits fractional.
pub type Fixed = i32;

/// Number of fractional bits (16)
pub const FIXED_SCALE: i32 = 16;

/// 1.0 in fixed-point (65536)
pub const FIXED_ONE: Fixed = 1 << FIXED_SCALE; // 65536

/// 0.5 in fixed-point (32768)
pub const FIXED_HALF: Fixed = FIXED_ONE >> 1; // 32768

/// Largest magnitude (in pixels) accepted from a level description.
pub const FIXED_LIMIT: f64 = 32767.0;

// =============================================================================
// PHYSICS DEFAULTS (All as integer literals - NO float conversion!)
// =============================================================================

/// Gravity: 0.8 px/tick² = floor(0.8 * 65536) = 52428
pub const GRAVITY: Fixed = 52428;

/// Horizontal walk speed: 3.0 px/tick = 3 * 65536 = 196608
pub const WALK_SPEED: Fixed = 196608;

/// Jump launch velocity: -15.0 px/tick (negative = up) = -15 * 65536
pub const JUMP_VELOCITY: Fixed = -983040;

/// Inward padding for landing checks: 8.0 px = 8 * 65536
pub const LANDING_PADDING: Fixed = 524288;

/// Downward tolerance for side blocking: 4.0 px = 4 * 65536
pub const SIDE_TOLERANCE: Fixed = 262144;

/// Slack when re-detecting support after a rescale (4 raw units).
pub const SUPPORT_EPSILON: Fixed = 4;

// =============================================================================
// CORE OPERATIONS (All deterministic, wrapping semantics)
// =============================================================================

/// Convert a decimal value to fixed-point.
///
/// # Warning
/// Only use at compile-time or world-build time. NEVER in the tick loop.
///
/// # Example
/// ```
/// use platformer::core::fixed::{to_fixed, FIXED_ONE};
/// const MY_VALUE: i32 = to_fixed(2.5);
/// assert_eq!(MY_VALUE, FIXED_ONE * 2 + FIXED_ONE / 2);
/// ```
#[inline]
pub const fn to_fixed(f: f64) -> Fixed {
    (f * (FIXED_ONE as f64)) as Fixed
}

/// Convert fixed-point to float for rendering.
///
/// # Warning
/// Only use for visual output. NEVER feed the result back into physics.
#[inline]
pub fn to_float(f: Fixed) -> f32 {
    f as f32 / FIXED_ONE as f32
}

/// Check that a decimal value survives conversion to Q16.16.
#[inline]
pub fn fits_fixed(f: f64) -> bool {
    f.is_finite() && f.abs() <= FIXED_LIMIT
}

/// Multiply two fixed-point numbers.
///
/// Uses i64 intermediate to prevent overflow, then truncates.
#[inline]
pub fn fixed_mul(a: Fixed, b: Fixed) -> Fixed {
    let wide = (a as i64) * (b as i64);
    (wide >> FIXED_SCALE) as Fixed
}

/// Multiply two fixed-point numbers, returning `None` if the result leaves
/// the Q16.16 range.
#[inline]
pub fn fixed_mul_checked(a: Fixed, b: Fixed) -> Option<Fixed> {
    let wide = ((a as i64) * (b as i64)) >> FIXED_SCALE;
    Fixed::try_from(wide).ok()
}

/// Divide two fixed-point numbers.
///
/// Pre-shifts numerator to maintain precision.
/// Returns 0 on divide-by-zero.
#[inline]
pub fn fixed_div(a: Fixed, b: Fixed) -> Fixed {
    if b == 0 {
        return 0;
    }
    let wide = (a as i64) << FIXED_SCALE;
    (wide / b as i64) as Fixed
}

/// Absolute value of a fixed-point number.
#[inline]
pub fn fixed_abs(x: Fixed) -> Fixed {
    if x < 0 { x.wrapping_neg() } else { x }
}

/// Minimum of two fixed-point numbers.
#[inline]
pub fn fixed_min(a: Fixed, b: Fixed) -> Fixed {
    if a < b { a } else { b }
}

/// Maximum of two fixed-point numbers.
#[inline]
pub fn fixed_max(a: Fixed, b: Fixed) -> Fixed {
    if a > b { a } else { b }
}

/// Clamp a fixed-point number to a range.
///
/// When the range is empty (`min > max`) the lower bound wins.
#[inline]
pub fn fixed_clamp(value: Fixed, min: Fixed, max: Fixed) -> Fixed {
    fixed_max(min, fixed_min(max, value))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_constants() {
        assert_eq!(FIXED_ONE, 65536);
        assert_eq!(FIXED_HALF, 32768);
        assert_eq!(FIXED_SCALE, 16);
    }

    #[test]
    fn test_physics_defaults() {
        assert_eq!(GRAVITY, to_fixed(0.8));
        assert_eq!(WALK_SPEED, 3 * FIXED_ONE);
        assert_eq!(JUMP_VELOCITY, -15 * FIXED_ONE);
        assert_eq!(LANDING_PADDING, 8 * FIXED_ONE);
        assert_eq!(SIDE_TOLERANCE, 4 * FIXED_ONE);
    }

    #[test]
    fn test_to_fixed() {
        assert_eq!(to_fixed(1.0), FIXED_ONE);
        assert_eq!(to_fixed(0.5), FIXED_HALF);
        assert_eq!(to_fixed(-1.0), -FIXED_ONE);
        assert_eq!(to_float(to_fixed(930.25)), 930.25);
    }

    #[test]
    fn test_fits_fixed() {
        assert!(fits_fixed(1920.0));
        assert!(fits_fixed(-32767.0));
        assert!(!fits_fixed(40000.0));
        assert!(!fits_fixed(f64::NAN));
        assert!(!fits_fixed(f64::INFINITY));
    }

    #[test]
    fn test_fixed_mul() {
        assert_eq!(fixed_mul(to_fixed(2.0), to_fixed(3.0)), to_fixed(6.0));
        assert_eq!(fixed_mul(FIXED_HALF, FIXED_HALF), to_fixed(0.25));
        assert_eq!(fixed_mul(to_fixed(-2.0), to_fixed(3.0)), to_fixed(-6.0));
        // Pixel-sized values do not overflow the i64 intermediate
        assert_eq!(fixed_mul(to_fixed(1920.0), to_fixed(2.0)), to_fixed(3840.0));
    }

    #[test]
    fn test_fixed_mul_checked() {
        assert_eq!(fixed_mul_checked(to_fixed(2.0), to_fixed(3.0)), Some(to_fixed(6.0)));
        assert_eq!(fixed_mul_checked(to_fixed(30000.0), to_fixed(2.0)), None);
    }

    #[test]
    fn test_fixed_div() {
        assert_eq!(fixed_div(to_fixed(6.0), to_fixed(2.0)), to_fixed(3.0));
        assert_eq!(fixed_div(FIXED_ONE, to_fixed(4.0)), to_fixed(0.25));
        assert_eq!(fixed_div(FIXED_ONE, 0), 0);
    }

    #[test]
    fn test_fixed_clamp() {
        assert_eq!(fixed_clamp(to_fixed(5.0), 0, to_fixed(3.0)), to_fixed(3.0));
        assert_eq!(fixed_clamp(to_fixed(-5.0), 0, to_fixed(3.0)), 0);
        assert_eq!(fixed_clamp(to_fixed(1.0), 0, to_fixed(3.0)), to_fixed(1.0));
        // Empty range resolves to the lower bound
        assert_eq!(fixed_clamp(to_fixed(1.0), to_fixed(2.0), 0), to_fixed(2.0));
        assert_eq!(fixed_abs(to_fixed(-7.0)), to_fixed(7.0));
    }

    #[test]
    fn test_gravity_accumulates_exactly() {
        // N ticks of gravity equal N * g with no drift
        let mut dy = JUMP_VELOCITY;
        for _ in 0..20 {
            dy = dy.wrapping_add(GRAVITY);
        }
        assert_eq!(dy, JUMP_VELOCITY + 20 * GRAVITY);
    }
}
