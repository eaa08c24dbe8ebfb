//! Game Logic Module
//!
//! All simulation code. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `input`: Intents, per-tick sampling, recording
//! - `level`: Level description, validation, world geometry
//! - `player`: Player state machine (locomotion and action axes)
//! - `collision`: Landing, side blocking and world-floor resolution
//! - `scroll`: Player-versus-world scroll arbitration
//! - `animation`: Sprite animation driver
//! - `state`: The simulation aggregate
//! - `tick`: Per-tick pipeline and replay
//! - `render`: Read-only snapshot for renderers
//! - `events`: Game events for logging and replay

pub mod input;
pub mod level;
pub mod player;
pub mod collision;
pub mod scroll;
pub mod animation;
pub mod state;
pub mod tick;
pub mod render;
pub mod events;

// Re-export key types
pub use input::{Intent, Press, InputFrame, IntentBuffer, InputRecording};
pub use level::{LevelDescription, LevelError, WorldGeometry, GeometryKind};
pub use player::{PlayerState, Facing, Locomotion, Action};
pub use animation::{AnimationClip, AnimationKey, AnimationTable};
pub use state::{Simulation, Viewport};
pub use tick::{TickResult, PhysicsConfig, replay};
pub use render::RenderSnapshot;
pub use events::{GameEvent, GameEventKind};
