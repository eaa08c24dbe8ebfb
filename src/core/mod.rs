//! Core deterministic primitives.
//!
//! All types in this module are designed for bit-exact replay:
//! integer-only arithmetic, no platform-dependent rounding.

pub mod fixed;
pub mod vec2;
pub mod rect;
pub mod hash;

// Re-export core types
pub use fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use vec2::FixedVec2;
pub use rect::FixedRect;
pub use hash::{compute_state_hash, StateHash};
