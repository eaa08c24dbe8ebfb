//! Game Events
//!
//! Events generated during simulation for logging, replay and tests.

use serde::{Serialize, Deserialize};

pub use crate::game::collision::Surface;

/// Game event data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventKind {
    /// Player left the ground with a jump
    Jumped,

    /// Player came to rest on a floor line
    Landed {
        /// What the player landed on
        surface: Surface,
    },

    /// Player walked off a ledge
    LeftGround,

    /// Attack animation started
    AttackStarted,

    /// Attack animation completed; control returned to locomotion
    AttackFinished,

    /// Horizontal motion clamped by an obstacle
    Blocked {
        /// Geometry index of the obstacle
        obstacle: usize,
    },

    /// The world scrolled for the first time
    ScrollStarted,

    /// Background offset wrapped around
    BackgroundWrapped,

    /// The scrollable range is used up; the player moves past the midpoint
    ScrollExhausted,
}

/// A game event stamped with the tick that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Event data
    pub kind: GameEventKind,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u32, kind: GameEventKind) -> Self {
        Self { tick, kind }
    }

    /// Check if this event changes ground contact.
    pub fn is_contact_change(&self) -> bool {
        matches!(
            self.kind,
            GameEventKind::Jumped | GameEventKind::Landed { .. } | GameEventKind::LeftGround
        )
    }

    /// Check if this event comes from the scroll controller.
    pub fn is_scroll(&self) -> bool {
        matches!(
            self.kind,
            GameEventKind::ScrollStarted
                | GameEventKind::BackgroundWrapped
                | GameEventKind::ScrollExhausted
        )
    }
}
