//! Player State Machine
//!
//! The player's mode is two orthogonal axes instead of a pile of flags:
//!
//! ```text
//!   locomotion:  Standing <──> Walking          action:  Idle
//!                    │  ▲        │  ▲                      │  ▲
//!               jump │  │ land   │  │ land          attack │  │ clip complete
//!                    ▼  │        ▼  │                      ▼  │
//!                   Jumping (airborne)                   Attacking
//! ```
//!
//! Every transition goes through a method on [`PlayerState`]; the tick loop
//! never writes the mode fields directly.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, fixed_mul};
use crate::core::hash::StateHasher;
use crate::core::rect::FixedRect;
use crate::core::vec2::FixedVec2;
use crate::game::animation::{AnimationKey, AnimationState};

/// Direction the sprite faces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Facing {
    /// Facing left (sprite mirrored)
    Left = 0,
    /// Facing right
    #[default]
    Right = 1,
}

/// Locomotion axis of the player mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Locomotion {
    /// On the ground, no horizontal intent
    #[default]
    Standing = 0,
    /// On the ground, horizontal intent held
    Walking = 1,
    /// Airborne (after a jump or walking off a ledge)
    Jumping = 2,
}

/// Action axis of the player mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    /// No action in progress
    #[default]
    Idle = 0,
    /// Attack animation in progress
    Attacking = 1,
}

/// The single player entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Top-left of the bounding box (screen space)
    pub position: FixedVec2,

    /// Per-tick displacement; `x` is the horizontal intent applied this tick
    pub velocity: FixedVec2,

    /// Bounding box size (base size times the current scale)
    pub size: FixedVec2,

    /// Bounding box size at scale 1.0
    pub base_size: FixedVec2,

    /// Sprite facing
    pub facing: Facing,

    /// Locomotion axis
    pub locomotion: Locomotion,

    /// Action axis
    pub action: Action,

    /// Resting on a floor line
    pub on_ground: bool,

    /// Animation driver state
    pub animation: AnimationState,
}

impl PlayerState {
    /// Create a standing player at `position`, sized for `scale`.
    ///
    /// The player starts airborne; the first tick settles it onto whatever
    /// floor is below the spawn point.
    pub fn new(position: FixedVec2, base_size: FixedVec2, scale: Fixed) -> Self {
        Self {
            position,
            velocity: FixedVec2::ZERO,
            size: base_size.scale(scale),
            base_size,
            facing: Facing::Right,
            locomotion: Locomotion::Jumping,
            action: Action::Idle,
            on_ground: false,
            animation: AnimationState::default(),
        }
    }

    /// Current bounding box.
    #[inline]
    pub fn bounds(&self) -> FixedRect {
        FixedRect::from_pos_size(self.position, self.size)
    }

    /// Bounding box bottom edge.
    #[inline]
    pub fn bottom(&self) -> Fixed {
        self.position.y.wrapping_add(self.size.y)
    }

    /// Check if an attack is in progress.
    #[inline]
    pub fn is_attacking(&self) -> bool {
        self.action == Action::Attacking
    }

    /// Animation clip wanted for the current mode.
    #[inline]
    pub fn animation_key(&self) -> AnimationKey {
        AnimationKey::select(self.locomotion, self.action)
    }

    /// Apply horizontal intent and return this tick's horizontal displacement.
    ///
    /// While attacking, facing and the Standing/Walking axis are frozen, and
    /// the displacement is zero when `attack_halts` is set.
    pub fn apply_horizontal(&mut self, move_x: i8, speed: Fixed, attack_halts: bool) -> Fixed {
        let dx = (move_x as Fixed).wrapping_mul(speed);

        if self.is_attacking() {
            self.velocity.x = if attack_halts { 0 } else { dx };
            return self.velocity.x;
        }

        match move_x {
            x if x < 0 => self.facing = Facing::Left,
            x if x > 0 => self.facing = Facing::Right,
            _ => {}
        }
        if self.on_ground {
            self.locomotion = if move_x != 0 { Locomotion::Walking } else { Locomotion::Standing };
        }

        self.velocity.x = dx;
        dx
    }

    /// Start an attack. Returns `false` (no change) if one is in progress.
    pub fn start_attack(&mut self) -> bool {
        if self.is_attacking() {
            return false;
        }
        self.action = Action::Attacking;
        true
    }

    /// The attack clip finished; hand control back to locomotion.
    ///
    /// A grounded player resumes Walking or Standing from the current
    /// horizontal intent, not the one held when the attack began.
    pub fn finish_attack(&mut self, move_x: i8) {
        self.action = Action::Idle;
        if self.on_ground {
            self.locomotion = if move_x != 0 { Locomotion::Walking } else { Locomotion::Standing };
        }
        self.animation.restart(self.animation_key());
    }

    /// Launch a jump. Only possible with ground contact.
    pub fn try_jump(&mut self, launch_velocity: Fixed) -> bool {
        if !self.on_ground {
            return false;
        }
        self.velocity.y = launch_velocity;
        self.on_ground = false;
        self.locomotion = Locomotion::Jumping;
        true
    }

    /// Lose ground contact without jumping (walked off a ledge).
    pub fn leave_ground(&mut self) {
        self.on_ground = false;
        self.locomotion = Locomotion::Jumping;
    }

    /// Come to rest with the bottom edge on `floor_y`.
    ///
    /// Lands into Walking or Standing depending on the horizontal intent.
    pub fn land(&mut self, floor_y: Fixed, move_x: i8) {
        self.position.y = floor_y.wrapping_sub(self.size.y);
        self.velocity.y = 0;
        self.on_ground = true;
        self.locomotion = if move_x != 0 { Locomotion::Walking } else { Locomotion::Standing };
    }

    /// Resize the bounding box for a new scale.
    ///
    /// A grounded player keeps its bottom edge on the (equally rescaled)
    /// floor line; an airborne one keeps its top-left corner. Velocity is
    /// left alone since physics constants do not scale.
    pub fn rescale(&mut self, position_ratio: Fixed, new_scale: Fixed) {
        let bottom = fixed_mul(self.bottom(), position_ratio);
        self.size = self.base_size.scale(new_scale);
        self.position.x = fixed_mul(self.position.x, position_ratio);
        self.position.y = if self.on_ground {
            bottom.wrapping_sub(self.size.y)
        } else {
            fixed_mul(self.position.y, position_ratio)
        };
    }

    /// Mode axes are mutually consistent.
    pub fn is_consistent(&self) -> bool {
        let airborne = self.locomotion == Locomotion::Jumping;
        airborne != self.on_ground && (!self.on_ground || self.velocity.y == 0)
    }

    /// Hash this player's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_vec2(self.position);
        hasher.update_vec2(self.velocity);
        hasher.update_vec2(self.size);
        hasher.update_u8(self.facing as u8);
        hasher.update_u8(self.locomotion as u8);
        hasher.update_u8(self.action as u8);
        hasher.update_bool(self.on_ground);
        hasher.update_u8(self.animation.key as u8);
        hasher.update_u32(self.animation.ticks);
        hasher.update_u16(self.animation.frame);
    }
}

// =============================================================================
// TESTS
// =============================================================================
