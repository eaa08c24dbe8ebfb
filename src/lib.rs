//! # Platformer Simulation Core
//!
//! Deterministic simulation for a 2D side-scrolling platformer: one player
//! under gravity, AABB collision against static level geometry, world
//! scrolling and a sprite animation state machine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PLATFORMER SIM                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Deterministic primitives                 │
//! │  ├── fixed.rs     - Q16.16 fixed-point arithmetic            │
//! │  ├── vec2.rs      - 2D vector with fixed-point               │
//! │  ├── rect.rs      - Axis-aligned bounding boxes              │
//! │  └── hash.rs      - State hashing for verification           │
//! │                                                              │
//! │  game/            - Simulation (deterministic)               │
//! │  ├── input.rs     - Intents, sampling, recording             │
//! │  ├── level.rs     - Level description and geometry           │
//! │  ├── player.rs    - Player state machine                     │
//! │  ├── collision.rs - Collision resolution                     │
//! │  ├── scroll.rs    - Scroll controller                        │
//! │  ├── animation.rs - Animation driver                         │
//! │  ├── state.rs     - Simulation aggregate                     │
//! │  ├── tick.rs      - Per-tick pipeline and replay             │
//! │  └── render.rs    - Render snapshot                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - No floating-point arithmetic inside a tick
//! - Geometry is iterated in build order
//! - No system time dependencies
//!
//! Given identical inputs, the simulation produces **identical state
//! hashes** on any platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use crate::core::fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use crate::core::vec2::FixedVec2;
pub use crate::core::rect::FixedRect;
pub use crate::game::input::{Intent, Press, InputFrame, InputRecording};
pub use crate::game::level::{LevelDescription, LevelError};
pub use crate::game::state::Simulation;
pub use crate::game::tick::{tick, replay, TickResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Nominal tick rate (Hz) of the frame driver. Physics constants are per
/// tick, so a different cadence changes simulated speed.
pub const TICK_RATE: u32 = 60;
