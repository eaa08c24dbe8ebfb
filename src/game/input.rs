//! Input Intents, Sampling and Recording
//!
//! Key events are translated into discrete intents and written into an
//! [`IntentBuffer`]. The simulation samples the buffer exactly once per tick,
//! which decouples input timing from simulation timing and makes every run
//! replayable from an [`InputRecording`].

use serde::{Serialize, Deserialize};
use tracing::trace;

use crate::core::hash::{hash_with_domain, StateHash};

// =============================================================================
// INTENTS
// =============================================================================

/// Key transition for held intents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Press {
    /// Key went down
    Pressed,
    /// Key went up
    Released,
}

/// Discrete player intent delivered by the input boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    /// Move left (held)
    MoveLeft(Press),
    /// Move right (held)
    MoveRight(Press),
    /// Jump (one-shot, on press)
    Jump,
    /// Attack (one-shot, on press)
    Attack,
}

impl Intent {
    /// Map a key name to an intent.
    ///
    /// Returns `None` for unrecognized keys and for releases of one-shot
    /// intents; both leave the simulation untouched.
    pub fn from_key(key: &str, press: Press) -> Option<Self> {
        match (key, press) {
            ("ArrowLeft", p) => Some(Intent::MoveLeft(p)),
            ("ArrowRight", p) => Some(Intent::MoveRight(p)),
            (" " | "Space", Press::Pressed) => Some(Intent::Jump),
            ("z" | "Z" | "KeyZ", Press::Pressed) => Some(Intent::Attack),
            _ => None,
        }
    }
}

// =============================================================================
// INPUT FRAME
// =============================================================================

/// Input state sampled for a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputFrame {
    /// Horizontal intent: -1 (left), 0 (none), +1 (right)
    pub move_x: i8,

    /// Action flags (packed bits):
    /// - Bit 0: Jump pressed since the previous tick
    /// - Bit 1: Attack pressed since the previous tick
    /// - Bit 2-7: Reserved
    pub flags: u8,
}

impl InputFrame {
    /// Jump flag bit
    pub const FLAG_JUMP: u8 = 0x01;

    /// Attack flag bit
    pub const FLAG_ATTACK: u8 = 0x02;

    /// Create a new empty input frame.
    pub const fn new() -> Self {
        Self { move_x: 0, flags: 0 }
    }

    /// Create input with a horizontal direction (clamped to -1..=1).
    pub const fn with_movement(move_x: i8) -> Self {
        Self {
            move_x: if move_x > 0 { 1 } else if move_x < 0 { -1 } else { 0 },
            flags: 0,
        }
    }

    /// Builder: set the jump flag.
    pub fn with_jump(mut self) -> Self {
        self.flags |= Self::FLAG_JUMP;
        self
    }

    /// Builder: set the attack flag.
    pub fn with_attack(mut self) -> Self {
        self.flags |= Self::FLAG_ATTACK;
        self
    }

    /// Check if jump was pressed this frame.
    #[inline]
    pub fn jump_pressed(&self) -> bool {
        self.flags & Self::FLAG_JUMP != 0
    }

    /// Check if attack was pressed this frame.
    #[inline]
    pub fn attack_pressed(&self) -> bool {
        self.flags & Self::FLAG_ATTACK != 0
    }

    /// Check if there is any horizontal intent.
    #[inline]
    pub fn has_movement(&self) -> bool {
        self.move_x != 0
    }

    /// Check if this is an idle frame (no input).
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.move_x == 0 && self.flags == 0
    }
}

// =============================================================================
// INTENT BUFFER
// =============================================================================

/// Intent state written by the input boundary and read once per tick.
#[derive(Clone, Debug, Default)]
pub struct IntentBuffer {
    left_held: bool,
    right_held: bool,
    /// Direction of the most recent horizontal press (wins when both held)
    last_pressed: i8,
    jump_latched: bool,
    attack_latched: bool,
}

impl IntentBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an intent event.
    pub fn apply(&mut self, intent: Intent) {
        match intent {
            Intent::MoveLeft(Press::Pressed) => {
                self.left_held = true;
                self.last_pressed = -1;
            }
            Intent::MoveLeft(Press::Released) => self.left_held = false,
            Intent::MoveRight(Press::Pressed) => {
                self.right_held = true;
                self.last_pressed = 1;
            }
            Intent::MoveRight(Press::Released) => self.right_held = false,
            Intent::Jump => self.jump_latched = true,
            Intent::Attack => self.attack_latched = true,
        }
    }

    /// Apply a raw key event. Returns whether the key was recognized.
    pub fn apply_key(&mut self, key: &str, press: Press) -> bool {
        match Intent::from_key(key, press) {
            Some(intent) => {
                self.apply(intent);
                true
            }
            None => {
                trace!(key, ?press, "ignoring unrecognized input");
                false
            }
        }
    }

    /// Current horizontal intent without consuming anything.
    pub fn horizontal(&self) -> i8 {
        match (self.left_held, self.right_held) {
            (true, true) => self.last_pressed,
            (true, false) => -1,
            (false, true) => 1,
            (false, false) => 0,
        }
    }

    /// Sample the frame for the next tick and clear one-shot latches.
    pub fn sample(&mut self) -> InputFrame {
        let mut frame = InputFrame::with_movement(self.horizontal());
        if std::mem::take(&mut self.jump_latched) {
            frame = frame.with_jump();
        }
        if std::mem::take(&mut self.attack_latched) {
            frame = frame.with_attack();
        }
        frame
    }
}

// =============================================================================
// INPUT RECORDING
// =============================================================================

/// Delta-compressed input entry.
///
/// Only stored when input CHANGES (not every tick).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDelta {
    /// Tick when this input state began
    pub tick: u32,
    /// The new input state
    pub frame: InputFrame,
}

impl InputDelta {
    /// Create new delta entry.
    pub fn new(tick: u32, frame: InputFrame) -> Self {
        Self { tick, frame }
    }
}

/// Recording errors.
#[derive(Debug, thiserror::Error)]
pub enum RecordingError {
    /// Binary encoding failed.
    #[error("Failed to encode recording: {0}")]
    Encode(#[source] bincode::Error),

    /// Binary decoding failed.
    #[error("Failed to decode recording: {0}")]
    Decode(#[source] bincode::Error),
}

/// Complete input recording for one session.
///
/// Used for replay playback and determinism checks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputRecording {
    /// First recorded tick (ticks are numbered from 1)
    pub start_tick: u32,

    /// Last recorded tick
    pub end_tick: u32,

    /// Only ticks where input CHANGED.
    deltas: Vec<InputDelta>,

    /// Last recorded input (for delta comparison)
    #[serde(skip)]
    last_frame: InputFrame,
}

impl InputRecording {
    /// Create an empty recording.
    pub fn new() -> Self {
        Self {
            start_tick: 1,
            end_tick: 0,
            deltas: Vec::with_capacity(64),
            last_frame: InputFrame::new(),
        }
    }

    /// Record input for a tick.
    ///
    /// Only stores if input changed from previous frame.
    pub fn record(&mut self, tick: u32, frame: InputFrame) {
        self.end_tick = tick;

        if frame != self.last_frame {
            self.deltas.push(InputDelta::new(tick, frame));
            self.last_frame = frame;
        }
    }

    /// Get input at a specific tick.
    pub fn get_input_at(&self, tick: u32) -> InputFrame {
        // Last delta at or before this tick
        let idx = self.deltas.partition_point(|d| d.tick <= tick);

        if idx == 0 {
            InputFrame::new()
        } else {
            self.deltas[idx - 1].frame
        }
    }

    /// Get all deltas.
    pub fn deltas(&self) -> &[InputDelta] {
        &self.deltas
    }

    /// Number of delta entries.
    pub fn delta_count(&self) -> usize {
        self.deltas.len()
    }

    /// Number of recorded ticks.
    pub fn tick_count(&self) -> u32 {
        (self.end_tick + 1).saturating_sub(self.start_tick)
    }

    /// Create iterator over all inputs for replay.
    pub fn replay_iter(&self) -> ReplayIterator<'_> {
        ReplayIterator {
            recording: self,
            current_tick: self.start_tick,
            delta_idx: 0,
            current_frame: InputFrame::new(),
        }
    }

    /// Encode to a compact binary form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RecordingError> {
        bincode::serialize(self).map_err(RecordingError::Encode)
    }

    /// Decode from the binary form produced by [`InputRecording::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordingError> {
        let mut recording: Self = bincode::deserialize(bytes).map_err(RecordingError::Decode)?;
        recording.last_frame = recording
            .deltas
            .last()
            .map(|d| d.frame)
            .unwrap_or_default();
        Ok(recording)
    }

    /// Content digest of the encoded recording.
    pub fn digest(&self) -> Result<StateHash, RecordingError> {
        Ok(hash_with_domain(b"PLATFORMER_INPUTS_V1", &self.to_bytes()?))
    }
}

impl Default for InputRecording {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator for replaying inputs tick-by-tick.
pub struct ReplayIterator<'a> {
    recording: &'a InputRecording,
    current_tick: u32,
    delta_idx: usize,
    current_frame: InputFrame,
}

impl<'a> Iterator for ReplayIterator<'a> {
    type Item = (u32, InputFrame);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_tick > self.recording.end_tick {
            return None;
        }

        while let Some(delta) = self.recording.deltas.get(self.delta_idx) {
            if delta.tick > self.current_tick {
                break;
            }
            self.current_frame = delta.frame;
            self.delta_idx += 1;
        }

        let result = (self.current_tick, self.current_frame);
        self.current_tick += 1;
        Some(result)
    }
}

// =============================================================================
// TESTS
// =============================================================================
