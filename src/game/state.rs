//! Simulation State
//!
//! The [`Simulation`] aggregate owns every piece of mutable state: the
//! player, the world geometry and the scroll state. There are no globals;
//! each tick receives the aggregate by mutable reference.

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::core::fixed::{Fixed, fixed_clamp, fixed_div, fixed_mul_checked, to_fixed, to_float};
use crate::core::hash::{StateHash, compute_state_hash};
use crate::core::vec2::FixedVec2;
use crate::game::animation::AnimationTable;
use crate::game::collision::find_support;
use crate::game::events::GameEvent;
use crate::game::input::{Intent, IntentBuffer, Press};
use crate::game::level::{
    scaled_px, validate_scale, validate_viewport, LevelDescription, LevelError, WorldGeometry,
};
use crate::game::player::PlayerState;
use crate::game::render::RenderSnapshot;
use crate::game::scroll::ScrollState;
use crate::game::tick::{tick, PhysicsConfig, TickResult};

// =============================================================================
// VIEWPORT
// =============================================================================

/// Visible area in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width
    pub width: Fixed,
    /// Height
    pub height: Fixed,
}

impl Viewport {
    /// Validate and convert a viewport size.
    pub fn from_px(width: f64, height: f64) -> Result<Self, LevelError> {
        validate_viewport(width, height)?;
        Ok(Self {
            width: to_fixed(width),
            height: to_fixed(height),
        })
    }

    /// Horizontal anchor past which the world scrolls.
    #[inline]
    pub fn midpoint_x(&self) -> Fixed {
        self.width / 2
    }
}

// =============================================================================
// SIMULATION
// =============================================================================

/// Complete state of one platformer session.
#[derive(Clone, Debug)]
pub struct Simulation {
    /// Ticks run so far (the first tick is 1)
    pub tick: u32,

    /// Current scale factor
    pub scale: Fixed,

    /// Visible area
    pub viewport: Viewport,

    /// The player entity
    pub player: PlayerState,

    /// Static level rectangles (scrolled and scaled)
    pub geometry: WorldGeometry,

    /// Authoritative scroll state
    pub scroll: ScrollState,

    /// Absolute floor line
    pub world_floor_y: Fixed,

    /// Physics constants
    pub physics: PhysicsConfig,

    /// Animation metadata
    pub animations: AnimationTable,

    /// Intent written by the input boundary, sampled once per tick
    intents: IntentBuffer,

    /// Events generated during the current tick
    pending_events: Vec<GameEvent>,
}

impl Simulation {
    /// Build a simulation from a level description.
    ///
    /// Refuses to start on any configuration error.
    pub fn new(level: &LevelDescription) -> Result<Self, LevelError> {
        level.validate()?;

        let scale = to_fixed(level.scale);
        let geometry = WorldGeometry::from_description(level)?;
        let viewport = Viewport::from_px(level.viewport.width, level.viewport.height)?;
        let base_size = FixedVec2::new(
            scaled_px("player_size.width", level.player_size.width, 1.0)?,
            scaled_px("player_size.height", level.player_size.height, 1.0)?,
        );
        let spawn = FixedVec2::new(
            scaled_px("spawn.x", level.spawn.x, level.scale)?,
            scaled_px("spawn.y", level.spawn.y, level.scale)?,
        );
        let scroll = ScrollState::new(
            scaled_px("background_width", level.background_width, level.scale)?,
            scaled_px("scroll_range", level.effective_scroll_range(), level.scale)?,
        );

        let mut sim = Self {
            tick: 0,
            scale,
            viewport,
            player: PlayerState::new(spawn, base_size, scale),
            geometry,
            scroll,
            world_floor_y: scaled_px("world_floor_y", level.world_floor_y, level.scale)?,
            physics: PhysicsConfig::from_description(&level.physics),
            animations: level.animations,
            intents: IntentBuffer::new(),
            pending_events: Vec::new(),
        };
        sim.settle();

        info!(
            rects = sim.geometry.len(),
            scale = level.scale,
            grounded = sim.player.on_ground,
            "built simulation"
        );
        Ok(sim)
    }

    /// Apply an intent event; takes effect at the next tick.
    pub fn apply_intent(&mut self, intent: Intent) {
        self.intents.apply(intent);
    }

    /// Apply a raw key event. Unrecognized keys are ignored.
    pub fn apply_key(&mut self, key: &str, press: Press) -> bool {
        self.intents.apply_key(key, press)
    }

    /// Sample the intent buffer and run one tick.
    pub fn step(&mut self) -> TickResult {
        let input = self.intents.sample();
        tick(self, input)
    }

    /// Read-only view for the renderer.
    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot::capture(self)
    }

    /// Apply a new viewport size and scale factor.
    ///
    /// Player size, geometry, floor and scroll lengths are rescaled
    /// proportionally. On error nothing changes.
    pub fn resize(&mut self, width: f64, height: f64, scale: f64) -> Result<(), LevelError> {
        let viewport = Viewport::from_px(width, height)?;
        validate_scale(scale)?;

        let new_scale = to_fixed(scale);
        let ratio = fixed_div(new_scale, self.scale);

        let mut geometry = self.geometry.clone();
        geometry.rescale(ratio)?;
        let world_floor_y = fixed_mul_checked(self.world_floor_y, ratio).ok_or_else(|| {
            LevelError::OutOfRange {
                field: "world_floor_y".into(),
                value: to_float(self.world_floor_y) as f64 * scale,
            }
        })?;
        for value in [
            self.player.position.x,
            self.player.bottom(),
            self.scroll.background_width,
            self.scroll.range,
        ] {
            if fixed_mul_checked(value, ratio).is_none() {
                return Err(LevelError::OutOfRange {
                    field: "player".into(),
                    value: to_float(value) as f64 * scale,
                });
            }
        }
        let mut scroll = self.scroll;
        scroll.rescale(ratio);
        geometry.check_scroll(scroll.remaining())?;

        self.geometry = geometry;
        self.world_floor_y = world_floor_y;
        self.viewport = viewport;
        self.scale = new_scale;
        self.player.rescale(ratio, new_scale);
        self.scroll = scroll;
        self.settle();

        info!(width, height, scale, "resized simulation");
        self.debug_check_invariants();
        Ok(())
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, |hasher| {
            self.player.hash_into(hasher);

            // Geometry in build order
            for geo in self.geometry.rects() {
                hasher.update_rect(&geo.rect);
            }

            self.scroll.hash_into(hasher);
            hasher.update_fixed(self.world_floor_y);
            hasher.update_fixed(self.scale);
            hasher.update_fixed(self.viewport.width);
            hasher.update_fixed(self.viewport.height);
        })
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }

    /// Fit the player inside the viewport and onto whatever floor lies at
    /// its feet.
    fn settle(&mut self) {
        let max_x = self.viewport.width.wrapping_sub(self.player.size.x);
        self.player.position.x = fixed_clamp(self.player.position.x, 0, max_x);

        let params = self.physics.collision_params(self.world_floor_y);
        let support = find_support(&self.player.bounds(), &self.geometry, &params);
        let below_floor = self.player.bottom() > self.world_floor_y;

        match support {
            Some(line) if line <= self.world_floor_y => {
                self.player.land(line, self.player.velocity.x.signum() as i8)
            }
            _ if below_floor => {
                self.player.land(self.world_floor_y, self.player.velocity.x.signum() as i8)
            }
            _ if self.player.on_ground => self.player.leave_ground(),
            _ => {}
        }
    }

    /// Fail fast on states the tick loop must never produce.
    pub(crate) fn debug_check_invariants(&self) {
        debug_assert!(
            !self.player.on_ground || self.player.velocity.y == 0,
            "grounded with vertical velocity {}",
            self.player.velocity.y
        );
        debug_assert!(
            self.player.bottom() <= self.world_floor_y,
            "player below the world floor"
        );
        debug_assert!(self.player.is_consistent(), "locomotion contradicts ground contact");
        debug_assert!(self.scroll.is_valid(), "scroll offset {} out of range", self.scroll.offset);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::FIXED_ONE;
    use crate::game::events::GameEventKind;
    use crate::game::level::{RectDescription, TileLayerDescription};
    use crate::game::player::Locomotion;

    fn px(v: i32) -> Fixed {
        v * FIXED_ONE
    }

    #[test]
    fn test_new_rejects_invalid_level() {
        let mut level = LevelDescription::demo();
        level.obstacles[0].width = -1.0;
        assert!(Simulation::new(&level).is_err());
    }

    #[test]
    fn test_demo_spawn_falls_to_ground() {
        let mut sim = Simulation::new(&LevelDescription::demo()).unwrap();
        // Spawned above the ground strip
        assert!(!sim.player.on_ground);

        let mut landed = false;
        for _ in 0..60 {
            landed |= sim
                .step()
                .events
                .iter()
                .any(|e| matches!(e.kind, GameEventKind::Landed { .. }));
        }
        assert!(landed);
        assert!(sim.player.on_ground);
        assert_eq!(sim.player.bottom(), px(750));
    }

    #[test]
    fn test_keys_feed_the_next_tick() {
        let mut sim = Simulation::new(&LevelDescription::demo()).unwrap();
        for _ in 0..60 {
            sim.step();
        }
        let x = sim.player.position.x;

        assert!(sim.apply_key("ArrowRight", Press::Pressed));
        assert!(!sim.apply_key("q", Press::Pressed));
        let result = sim.step();
        assert_eq!(result.input.move_x, 1);
        assert_eq!(sim.player.position.x, x + sim.physics.walk_speed);
        assert_eq!(sim.player.locomotion, Locomotion::Walking);

        sim.apply_intent(Intent::MoveRight(Press::Released));
        sim.apply_intent(Intent::Jump);
        let result = sim.step();
        assert!(result.events.iter().any(|e| e.kind == GameEventKind::Jumped));
        // One-shot intents do not repeat
        assert!(!sim.step().input.jump_pressed());
    }

    #[test]
    fn test_unrecognized_key_changes_nothing() {
        let mut a = Simulation::new(&LevelDescription::demo()).unwrap();
        let mut b = a.clone();
        a.apply_key("F13", Press::Pressed);
        a.apply_key(" ", Press::Released);
        a.step();
        b.step();
        assert_eq!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn test_resize_scales_layout() {
        let mut sim = Simulation::new(&LevelDescription::demo()).unwrap();
        for _ in 0..60 {
            sim.step();
        }
        let before = sim.snapshot();

        sim.resize(800.0, 450.0, 0.5).unwrap();
        assert_eq!(sim.player.size, FixedVec2::from_ints(64, 64));
        assert_eq!(sim.world_floor_y, px(375));
        assert_eq!(sim.geometry.rects()[1].rect.x, px(200));
        assert!(sim.player.on_ground);
        assert_eq!(sim.player.bottom(), px(375));
        assert_eq!(sim.scroll.background_width, px(800));

        let after = sim.snapshot();
        assert_eq!(after.player.x, before.player.x / 2.0);

        // Still ticks cleanly on the new scale
        for _ in 0..30 {
            sim.step();
        }
        assert!(sim.player.on_ground);
    }

    #[test]
    fn test_resize_error_leaves_state_untouched() {
        let mut sim = Simulation::new(&LevelDescription::demo()).unwrap();
        let hash = sim.compute_hash();

        assert!(matches!(sim.resize(0.0, 900.0, 1.0), Err(LevelError::InvalidViewport { .. })));
        assert!(matches!(sim.resize(1600.0, 900.0, -1.0), Err(LevelError::InvalidScale(_))));
        // Geometry would leave the coordinate range
        assert!(matches!(sim.resize(1600.0, 900.0, 30.0), Err(LevelError::OutOfRange { .. })));
        assert_eq!(sim.compute_hash(), hash);
    }

    #[test]
    fn test_resize_rejects_scroll_past_coordinate_range() {
        let mut level = LevelDescription::demo();
        level.tile_layers.push(TileLayerDescription {
            name: Some("far left".into()),
            rects: vec![RectDescription::new(-16000.0, 600.0, 100.0, 24.0)],
        });
        let mut sim = Simulation::new(&level).unwrap();
        let hash = sim.compute_hash();

        // The tile itself still fits at scale 2, but not once scrolled
        assert!(matches!(
            sim.resize(1600.0, 900.0, 2.0),
            Err(LevelError::OutOfRange { .. })
        ));
        assert_eq!(sim.compute_hash(), hash);
    }

    #[test]
    fn test_hash_tracks_state() {
        let mut a = Simulation::new(&LevelDescription::demo()).unwrap();
        let b = a.clone();
        assert_eq!(a.compute_hash(), b.compute_hash());

        a.step();
        assert_ne!(a.compute_hash(), b.compute_hash());
    }
}
