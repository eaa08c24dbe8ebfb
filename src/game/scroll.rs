//! Scroll Controller
//!
//! Decides each tick whether the player moves or the world moves. Past the
//! viewport midpoint (moving right) the player is held in place and the
//! geometry plus the background offset shift left instead, until the
//! scrollable range is used up.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::fixed::{Fixed, fixed_max, fixed_min, fixed_mul};
use crate::core::hash::StateHasher;
use crate::game::level::WorldGeometry;

/// Authoritative horizontal scroll state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollState {
    /// Background offset, always in `(-background_width, 0]`
    pub offset: Fixed,
    /// Width of one background tile
    pub background_width: Fixed,
    /// Total distance scrolled so far
    pub travelled: Fixed,
    /// Total distance the world may scroll
    pub range: Fixed,
}

/// What the controller did this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScrollOutcome {
    /// Distance the world moved left
    pub shift: Fixed,
    /// First scroll of the session
    pub started: bool,
    /// Background offset wrapped back toward 0
    pub wrapped: bool,
    /// The scrollable range was used up this tick
    pub exhausted: bool,
}

impl ScrollState {
    /// Create an unscrolled state.
    pub fn new(background_width: Fixed, range: Fixed) -> Self {
        Self {
            offset: 0,
            background_width,
            travelled: 0,
            range,
        }
    }

    /// Distance left to scroll.
    #[inline]
    pub fn remaining(&self) -> Fixed {
        fixed_max(self.range.wrapping_sub(self.travelled), 0)
    }

    /// Check if the world can no longer scroll.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Offset lies in `(-background_width, 0]`.
    pub fn is_valid(&self) -> bool {
        self.offset <= 0 && self.offset > -self.background_width
    }

    /// Rescale every length by `ratio`.
    pub fn rescale(&mut self, ratio: Fixed) {
        self.background_width = fixed_max(fixed_mul(self.background_width, ratio), 1);
        self.travelled = fixed_mul(self.travelled, ratio);
        self.range = fixed_mul(self.range, ratio);
        self.offset = fixed_min(fixed_mul(self.offset, ratio), 0);
        self.wrap();
    }

    /// Hash the scroll state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_fixed(self.offset);
        hasher.update_fixed(self.background_width);
        hasher.update_fixed(self.travelled);
        hasher.update_fixed(self.range);
    }

    fn wrap(&mut self) -> bool {
        let mut wrapped = false;
        while self.offset <= -self.background_width {
            self.offset = self.offset.wrapping_add(self.background_width);
            wrapped = true;
        }
        wrapped
    }

    /// Arbitrate this tick's horizontal displacement.
    ///
    /// `player_x` already includes `dx`. When the player is pushed past
    /// `midpoint` while moving right and range remains, the overshoot (never
    /// more than `dx`) is taken back from the player and applied to the
    /// world as a leftward shift. Leftward motion never scrolls back.
    pub fn advance(
        &mut self,
        player_x: &mut Fixed,
        dx: Fixed,
        midpoint: Fixed,
        geometry: &mut WorldGeometry,
    ) -> ScrollOutcome {
        let mut outcome = ScrollOutcome::default();
        let remaining = self.remaining();
        if dx <= 0 || remaining == 0 || *player_x <= midpoint {
            return outcome;
        }

        let shift = fixed_min(fixed_min(player_x.wrapping_sub(midpoint), dx), remaining);

        *player_x = player_x.wrapping_sub(shift);
        geometry.translate_x(-shift);
        self.offset = self.offset.wrapping_sub(shift);
        outcome.started = self.travelled == 0;
        self.travelled = self.travelled.wrapping_add(shift);

        outcome.shift = shift;
        outcome.wrapped = self.wrap();
        outcome.exhausted = self.is_exhausted();
        if outcome.exhausted {
            debug!(travelled = self.travelled, "scroll range exhausted");
        }
        outcome
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::FIXED_ONE;
    use crate::core::rect::FixedRect;
    use crate::game::level::{GeometryKind, GeometryRect};

    fn px(v: i32) -> Fixed {
        v * FIXED_ONE
    }

    fn one_tile() -> WorldGeometry {
        WorldGeometry::from_rects(vec![GeometryRect {
            rect: FixedRect::new(px(800), px(700), px(400), px(100)),
            kind: GeometryKind::Ground { layer: 0 },
        }])
    }

    #[test]
    fn test_left_of_midpoint_player_moves() {
        let mut scroll = ScrollState::new(px(900), px(900));
        let mut geometry = one_tile();
        let mut x = px(300);

        let outcome = scroll.advance(&mut x, px(3), px(600), &mut geometry);
        assert_eq!(outcome, ScrollOutcome::default());
        assert_eq!(x, px(300));
        assert_eq!(geometry.rects()[0].rect.x, px(800));
    }

    #[test]
    fn test_crossing_midpoint_splits_the_step() {
        let mut scroll = ScrollState::new(px(900), px(900));
        let mut geometry = one_tile();
        // Moved from 599 to 602
        let mut x = px(602);

        let outcome = scroll.advance(&mut x, px(3), px(600), &mut geometry);
        assert_eq!(outcome.shift, px(2));
        assert!(outcome.started);
        assert_eq!(x, px(600));
        assert_eq!(scroll.offset, -px(2));
        assert_eq!(geometry.rects()[0].rect.x, px(798));
    }

    #[test]
    fn test_held_at_midpoint_world_moves() {
        let mut scroll = ScrollState::new(px(900), px(900));
        let mut geometry = one_tile();

        for tick in 1..=10 {
            let mut x = px(603);
            let outcome = scroll.advance(&mut x, px(3), px(600), &mut geometry);
            assert_eq!(x, px(600));
            assert_eq!(outcome.started, tick == 1);
            assert_eq!(geometry.rects()[0].rect.x, px(800 - 3 * tick));
        }
        assert_eq!(scroll.offset, -px(30));
    }

    #[test]
    fn test_leftward_never_scrolls() {
        let mut scroll = ScrollState::new(px(900), px(900));
        scroll.offset = -px(30);
        scroll.travelled = px(30);
        let mut geometry = one_tile();
        let mut x = px(700);

        scroll.advance(&mut x, -px(3), px(600), &mut geometry);
        assert_eq!(x, px(700));
        assert_eq!(scroll.offset, -px(30));
    }

    #[test]
    fn test_wrap_and_exhaust() {
        let mut scroll = ScrollState::new(px(900), px(900));
        scroll.offset = -px(898);
        scroll.travelled = px(898);
        let mut geometry = one_tile();
        let mut x = px(603);

        let outcome = scroll.advance(&mut x, px(3), px(600), &mut geometry);
        // Only 2 px of range were left; the third is the player's
        assert_eq!(outcome.shift, px(2));
        assert_eq!(x, px(601));
        assert!(outcome.wrapped);
        assert!(outcome.exhausted);
        assert_eq!(scroll.offset, 0);
        assert!(scroll.is_valid());

        // Past exhaustion the player walks freely
        let mut x = px(604);
        let outcome = scroll.advance(&mut x, px(3), px(600), &mut geometry);
        assert_eq!(outcome.shift, 0);
        assert_eq!(x, px(604));
    }

    #[test]
    fn test_longer_range_wraps_repeatedly() {
        let mut scroll = ScrollState::new(px(100), px(1000));
        let mut geometry = one_tile();
        let mut wraps = 0;

        for _ in 0..200 {
            let mut x = px(605);
            if scroll.advance(&mut x, px(5), px(600), &mut geometry).wrapped {
                wraps += 1;
            }
            assert!(scroll.is_valid());
        }
        assert_eq!(wraps, 10);
        assert!(scroll.is_exhausted());
    }

    #[test]
    fn test_rescale_keeps_offset_valid() {
        let mut scroll = ScrollState::new(px(900), px(900));
        scroll.offset = -px(450);
        scroll.travelled = px(450);
        scroll.rescale(2 * FIXED_ONE);
        assert_eq!(scroll.offset, -px(900));
        assert_eq!(scroll.background_width, px(1800));
        assert_eq!(scroll.remaining(), px(900));
        assert!(scroll.is_valid());
    }
}
