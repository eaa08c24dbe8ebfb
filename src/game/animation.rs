//! Sprite Animation Driver
//!
//! Maps the player's (locomotion, action) pair and the ticks spent in the
//! active clip to a sprite-sheet frame. Rendering is not involved: the
//! output is a frame index and the rectangle it occupies in the sheet.

use serde::{Serialize, Deserialize};

use crate::game::level::LevelError;
use crate::game::player::{Action, Locomotion};

/// How a clip behaves after its last frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Playback {
    /// Wrap to the first frame forever
    #[default]
    Loop,
    /// Play once, then report completion
    Once,
}

/// Frame index for a given tick count within a clip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameAt {
    /// Frame index within the clip (0-based)
    pub index: u16,
    /// A `Once` clip ran past its final frame
    pub completed: bool,
}

/// Region of the sprite sheet to draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRect {
    /// Horizontal offset into the sheet in source pixels
    pub x_offset: u32,
    /// Vertical offset into the sheet in source pixels
    pub y_offset: u32,
    /// Frame width in source pixels
    pub width: u16,
    /// Frame height in source pixels
    pub height: u16,
}

/// Per-mode animation metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationClip {
    /// Sheet row holding this clip
    #[serde(default)]
    pub row: u16,
    /// Sheet column of frame 0
    #[serde(default)]
    pub start_frame: u16,
    /// Number of frames
    pub frame_count: u16,
    /// Frame width in source pixels
    pub frame_width: u16,
    /// Frame height in source pixels
    pub frame_height: u16,
    /// Ticks each frame stays on screen
    pub ticks_per_frame: u16,
    /// Loop or play once
    #[serde(default)]
    pub playback: Playback,
}

impl AnimationClip {
    /// A single frozen frame.
    pub const fn still(row: u16, start_frame: u16, size: u16) -> Self {
        Self {
            row,
            start_frame,
            frame_count: 1,
            frame_width: size,
            frame_height: size,
            ticks_per_frame: 1,
            playback: Playback::Loop,
        }
    }

    /// Total ticks for one pass over every frame.
    #[inline]
    pub fn duration_ticks(&self) -> u32 {
        self.frame_count as u32 * self.ticks_per_frame as u32
    }

    /// Frame shown after `ticks` ticks in this clip.
    pub fn frame_at(&self, ticks: u32) -> FrameAt {
        let tpf = self.ticks_per_frame.max(1) as u32;
        let count = self.frame_count.max(1) as u32;
        let raw = ticks / tpf;

        match self.playback {
            Playback::Loop => FrameAt { index: (raw % count) as u16, completed: false },
            Playback::Once if raw >= count => FrameAt { index: 0, completed: true },
            Playback::Once => FrameAt { index: raw as u16, completed: false },
        }
    }

    /// Lazy per-tick frame sequence starting at tick 0.
    ///
    /// Infinite for looping clips; a `Once` clip yields exactly
    /// `duration_ticks()` items. Call again to restart.
    pub fn frames(self) -> impl Iterator<Item = u16> {
        (0u32..).map_while(move |t| {
            let at = self.frame_at(t);
            (!at.completed).then_some(at.index)
        })
    }

    /// Sheet rectangle of a frame.
    pub fn frame_rect(&self, index: u16) -> FrameRect {
        FrameRect {
            x_offset: (self.start_frame as u32 + index as u32) * self.frame_width as u32,
            y_offset: self.row as u32 * self.frame_height as u32,
            width: self.frame_width,
            height: self.frame_height,
        }
    }

    fn validate(&self, clip: &'static str) -> Result<(), LevelError> {
        let reason = if self.frame_count == 0 {
            "frame_count must be at least 1"
        } else if self.ticks_per_frame == 0 {
            "ticks_per_frame must be at least 1"
        } else if self.frame_width == 0 || self.frame_height == 0 {
            "frame size must be positive"
        } else {
            return Ok(());
        };
        Err(LevelError::InvalidAnimation { clip, reason })
    }
}

/// Which clip of the table is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationKey {
    /// Standing still
    #[default]
    Standing,
    /// Walking cycle
    Walking,
    /// Airborne
    Jumping,
    /// Attack swing (overrides locomotion)
    Attacking,
}

impl AnimationKey {
    /// Select the clip for a player mode. The action axis wins.
    pub fn select(locomotion: Locomotion, action: Action) -> Self {
        match (action, locomotion) {
            (Action::Attacking, _) => AnimationKey::Attacking,
            (Action::Idle, Locomotion::Standing) => AnimationKey::Standing,
            (Action::Idle, Locomotion::Walking) => AnimationKey::Walking,
            (Action::Idle, Locomotion::Jumping) => AnimationKey::Jumping,
        }
    }
}

/// Immutable per-mode animation metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationTable {
    /// Standing clip
    pub standing: AnimationClip,
    /// Walking clip
    pub walking: AnimationClip,
    /// Jumping clip
    pub jumping: AnimationClip,
    /// Attacking clip (must play once)
    pub attacking: AnimationClip,
}

impl Default for AnimationTable {
    fn default() -> Self {
        Self {
            standing: AnimationClip::still(0, 0, 64),
            walking: AnimationClip {
                row: 0,
                start_frame: 0,
                frame_count: 9,
                frame_width: 64,
                frame_height: 64,
                ticks_per_frame: 10,
                playback: Playback::Loop,
            },
            // Frozen on frame 0 unless a level points it at an aerial frame
            jumping: AnimationClip::still(0, 0, 64),
            attacking: AnimationClip {
                row: 1,
                start_frame: 0,
                frame_count: 6,
                frame_width: 64,
                frame_height: 64,
                ticks_per_frame: 5,
                playback: Playback::Once,
            },
        }
    }
}

impl AnimationTable {
    /// Clip for a key.
    pub fn clip(&self, key: AnimationKey) -> &AnimationClip {
        match key {
            AnimationKey::Standing => &self.standing,
            AnimationKey::Walking => &self.walking,
            AnimationKey::Jumping => &self.jumping,
            AnimationKey::Attacking => &self.attacking,
        }
    }

    /// Every clip must be playable; the attack clip must terminate.
    pub fn validate(&self) -> Result<(), LevelError> {
        self.standing.validate("standing")?;
        self.walking.validate("walking")?;
        self.jumping.validate("jumping")?;
        self.attacking.validate("attacking")?;
        if self.attacking.playback != Playback::Once {
            return Err(LevelError::InvalidAnimation {
                clip: "attacking",
                reason: "playback must be Once",
            });
        }
        Ok(())
    }
}

/// Animation playback state carried by the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationState {
    /// Active clip
    pub key: AnimationKey,
    /// Ticks spent in the active clip
    pub ticks: u32,
    /// Current frame index within the clip
    pub frame: u16,
}

impl AnimationState {
    /// Advance one tick with `key` as the wanted clip.
    ///
    /// Switching clips restarts at frame 0. Returns `true` when a `Once`
    /// clip has just completed; the state is then back at frame 0.
    pub fn step(&mut self, key: AnimationKey, table: &AnimationTable) -> bool {
        let clip = table.clip(key);
        if key != self.key {
            self.key = key;
            self.ticks = 0;
        } else {
            self.ticks += 1;
            if clip.playback == Playback::Loop {
                self.ticks %= clip.duration_ticks().max(1);
            }
        }

        let at = clip.frame_at(self.ticks);
        if at.completed {
            self.ticks = 0;
        }
        self.frame = at.index;
        at.completed
    }

    /// Jump straight to frame 0 of `key`.
    pub fn restart(&mut self, key: AnimationKey) {
        self.key = key;
        self.ticks = 0;
        self.frame = 0;
    }

    /// Sheet rectangle of the current frame.
    pub fn frame_rect(&self, table: &AnimationTable) -> FrameRect {
        table.clip(self.key).frame_rect(self.frame)
    }
}

// =============================================================================
// TESTS
// =============================================================================
