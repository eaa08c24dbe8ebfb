//! Simulation Tick
//!
//! One tick runs to completion in a fixed order:
//!
//! ```text
//!   intent ─▶ support probe ─▶ gravity ─▶ integrate ─▶ resolve
//!          ─▶ scroll ─▶ viewport clamp ─▶ animation ─▶ invariants
//! ```
//!
//! Every step is integer arithmetic on Q16.16 values, so the same inputs
//! always produce the same state hash.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::fixed::{
    Fixed, fits_fixed, fixed_clamp, to_fixed,
    GRAVITY, JUMP_VELOCITY, LANDING_PADDING, SIDE_TOLERANCE, WALK_SPEED,
};
use crate::core::rect::FixedRect;
use crate::core::vec2::FixedVec2;
use crate::game::collision::{resolve, find_support, CollisionParams};
use crate::game::events::{GameEvent, GameEventKind};
use crate::game::input::{InputFrame, InputRecording};
use crate::game::level::{LevelDescription, LevelError};
use crate::game::state::Simulation;

// =============================================================================
// PHYSICS CONFIGURATION
// =============================================================================

/// Physics overrides as written in a level file (decimal pixels per tick).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsDescription {
    /// Downward acceleration per tick
    pub gravity: f64,
    /// Horizontal displacement per tick while walking
    pub walk_speed: f64,
    /// Vertical velocity set by a jump (negative is up)
    pub jump_velocity: f64,
    /// Inward padding of the player's span for landing checks
    pub landing_padding: f64,
    /// Bottom slice of the player ignored by side blocking
    pub side_tolerance: f64,
    /// Whether an attack stops horizontal movement
    pub attack_halts_movement: bool,
}

impl Default for PhysicsDescription {
    fn default() -> Self {
        Self {
            gravity: 0.8,
            walk_speed: 3.0,
            jump_velocity: -15.0,
            landing_padding: 8.0,
            side_tolerance: 4.0,
            attack_halts_movement: true,
        }
    }
}

impl PhysicsDescription {
    /// Every value must be finite, in range, and point the right way.
    pub fn validate(&self) -> Result<(), LevelError> {
        let checks: [(&'static str, f64, bool); 5] = [
            ("gravity", self.gravity, self.gravity > 0.0),
            ("walk_speed", self.walk_speed, self.walk_speed >= 0.0),
            ("jump_velocity", self.jump_velocity, self.jump_velocity <= 0.0),
            ("landing_padding", self.landing_padding, self.landing_padding >= 0.0),
            ("side_tolerance", self.side_tolerance, self.side_tolerance >= 0.0),
        ];
        for (field, value, sign_ok) in checks {
            if !fits_fixed(value) || !sign_ok {
                return Err(LevelError::InvalidPhysics { field, value });
            }
        }
        // Sub-raw-unit gravity would never pull the player down
        if to_fixed(self.gravity) <= 0 {
            return Err(LevelError::InvalidPhysics { field: "gravity", value: self.gravity });
        }
        Ok(())
    }
}

/// Runtime physics constants (fixed-point, per tick).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicsConfig {
    /// Downward acceleration per tick
    pub gravity: Fixed,
    /// Horizontal displacement per tick while walking
    pub walk_speed: Fixed,
    /// Vertical velocity set by a jump
    pub jump_velocity: Fixed,
    /// Landing padding
    pub landing_padding: Fixed,
    /// Side-blocking tolerance
    pub side_tolerance: Fixed,
    /// Attack stops horizontal movement
    pub attack_halts_movement: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            walk_speed: WALK_SPEED,
            jump_velocity: JUMP_VELOCITY,
            landing_padding: LANDING_PADDING,
            side_tolerance: SIDE_TOLERANCE,
            attack_halts_movement: true,
        }
    }
}

impl PhysicsConfig {
    /// Convert a validated description.
    pub fn from_description(desc: &PhysicsDescription) -> Self {
        Self {
            gravity: to_fixed(desc.gravity),
            walk_speed: to_fixed(desc.walk_speed),
            jump_velocity: to_fixed(desc.jump_velocity),
            landing_padding: to_fixed(desc.landing_padding),
            side_tolerance: to_fixed(desc.side_tolerance),
            attack_halts_movement: desc.attack_halts_movement,
        }
    }

    /// Collision tolerances against the given world floor.
    pub fn collision_params(&self, floor_y: Fixed) -> CollisionParams {
        CollisionParams {
            landing_padding: self.landing_padding,
            side_tolerance: self.side_tolerance,
            floor_y,
        }
    }
}

// =============================================================================
// TICK
// =============================================================================

/// Result of a tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickResult {
    /// Tick number that just ran
    pub tick: u32,
    /// Input frame consumed by this tick
    pub input: InputFrame,
    /// Events generated this tick
    pub events: Vec<GameEvent>,
}

/// Run one simulation tick.
///
/// # Arguments
///
/// * `sim` - The simulation (will be mutated)
/// * `input` - Intent sampled for this tick
///
/// # Determinism
///
/// Fixed-point math only, fixed geometry order, no system calls.
pub fn tick(sim: &mut Simulation, input: InputFrame) -> TickResult {
    // 0. Advance tick counter
    sim.tick += 1;
    let now = sim.tick;
    let physics = sim.physics;
    let params = physics.collision_params(sim.world_floor_y);

    // 1. Apply intent
    if input.attack_pressed() && sim.player.start_attack() {
        debug!(tick = now, "attack started");
        sim.push_event(GameEvent::new(now, GameEventKind::AttackStarted));
    }
    let dx = sim.player.apply_horizontal(
        input.move_x,
        physics.walk_speed,
        physics.attack_halts_movement,
    );
    if input.jump_pressed() && sim.player.try_jump(physics.jump_velocity) {
        debug!(tick = now, "jumped");
        sim.push_event(GameEvent::new(now, GameEventKind::Jumped));
    }

    // 2. Re-check support under a grounded player
    if sim.player.on_ground {
        match find_support(&sim.player.bounds(), &sim.geometry, &params) {
            Some(line) => sim.player.position.y = line.wrapping_sub(sim.player.size.y),
            None => {
                debug!(tick = now, "left ground");
                sim.player.leave_ground();
                sim.push_event(GameEvent::new(now, GameEventKind::LeftGround));
            }
        }
    }

    // 3. Gravity
    if !sim.player.on_ground {
        sim.player.velocity.y = sim.player.velocity.y.wrapping_add(physics.gravity);
    }

    // 4. Integrate and resolve
    let prev = sim.player.bounds();
    let dy = sim.player.velocity.y;
    let proposed = FixedRect::from_pos_size(prev.position() + FixedVec2::new(dx, dy), sim.player.size);
    let resolution = resolve(&prev, &proposed, dx, dy, sim.player.on_ground, &sim.geometry, &params);

    sim.player.position = resolution.position;
    sim.player.velocity.y = resolution.velocity_y;
    if let Some(surface) = resolution.landed_on {
        let line = resolution.position.y.wrapping_add(sim.player.size.y);
        sim.player.land(line, input.move_x);
        debug!(tick = now, ?surface, "landed");
        sim.push_event(GameEvent::new(now, GameEventKind::Landed { surface }));
    }
    if let Some(obstacle) = resolution.blocked_by {
        sim.push_event(GameEvent::new(now, GameEventKind::Blocked { obstacle }));
    }

    // 5. Scroll arbitration on the displacement that survived collision
    let applied_dx = resolution.position.x.wrapping_sub(prev.x);
    let midpoint = sim.viewport.midpoint_x();
    let mut x = sim.player.position.x;
    let outcome = sim.scroll.advance(&mut x, applied_dx, midpoint, &mut sim.geometry);
    if outcome.started {
        sim.push_event(GameEvent::new(now, GameEventKind::ScrollStarted));
    }
    if outcome.wrapped {
        sim.push_event(GameEvent::new(now, GameEventKind::BackgroundWrapped));
    }
    if outcome.exhausted {
        sim.push_event(GameEvent::new(now, GameEventKind::ScrollExhausted));
    }

    // 6. Viewport clamp
    let max_x = sim.viewport.width.wrapping_sub(sim.player.size.x);
    sim.player.position.x = fixed_clamp(x, 0, max_x);

    // 7. Animation
    let key = sim.player.animation_key();
    if sim.player.animation.step(key, &sim.animations) && sim.player.is_attacking() {
        sim.player.finish_attack(input.move_x);
        debug!(tick = now, "attack finished");
        sim.push_event(GameEvent::new(now, GameEventKind::AttackFinished));
    }

    // 8. Invariants
    sim.debug_check_invariants();

    TickResult {
        tick: now,
        input,
        events: sim.take_events(),
    }
}

/// Replay a session from recorded inputs.
///
/// Builds a fresh simulation from `level` and runs every recorded tick.
pub fn replay(
    level: &LevelDescription,
    recording: &InputRecording,
) -> Result<(Simulation, Vec<GameEvent>), LevelError> {
    let mut sim = Simulation::new(level)?;
    let mut all_events = Vec::new();

    for (recorded_tick, frame) in recording.replay_iter() {
        debug_assert_eq!(recorded_tick, sim.tick + 1);
        let result = tick(&mut sim, frame);
        all_events.extend(result.events);
    }

    Ok((sim, all_events))
}

// =============================================================================
// TESTS
// =============================================================================
