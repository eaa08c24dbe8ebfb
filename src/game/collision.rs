//! Collision Resolution
//!
//! Discrete AABB resolution of one player box against the level's static
//! rectangles. Three passes, always in this order:
//!
//! 1. Landing on any rectangle crossed from above this tick (highest line wins)
//! 2. Side blocking against obstacles in the direction of motion
//! 3. World-floor fallback
//!
//! All checks are pure functions of their inputs; nothing here mutates the
//! simulation.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, fixed_abs, fixed_max, fixed_min, SUPPORT_EPSILON};
use crate::core::rect::FixedRect;
use crate::core::vec2::FixedVec2;
use crate::game::level::WorldGeometry;

/// What the player came to rest on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Surface {
    /// Rectangle at this index of the world geometry
    Geometry(usize),
    /// The absolute world floor
    WorldFloor,
}

/// Tolerances and the world floor line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionParams {
    /// Inward padding of the player's horizontal span for landing
    pub landing_padding: Fixed,
    /// Bottom slice of the player ignored by side blocking
    pub side_tolerance: Fixed,
    /// Absolute floor line
    pub floor_y: Fixed,
}

/// Corrected motion for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Corrected top-left position
    pub position: FixedVec2,
    /// Corrected vertical velocity (zero on impact)
    pub velocity_y: Fixed,
    /// Ground contact after this tick
    pub on_ground: bool,
    /// Set when ground contact was established this tick
    pub landed_on: Option<Surface>,
    /// Obstacle that clamped horizontal motion this tick
    pub blocked_by: Option<usize>,
}

impl Resolution {
    /// Check if horizontal motion was clamped.
    #[inline]
    pub fn blocked(&self) -> bool {
        self.blocked_by.is_some()
    }
}

/// Resolve a proposed move.
///
/// * `prev` - player box at the start of the tick
/// * `proposed` - player box after integrating velocity
/// * `dx` / `dy` - this tick's displacement
/// * `was_on_ground` - contact state before integration
pub fn resolve(
    prev: &FixedRect,
    proposed: &FixedRect,
    dx: Fixed,
    dy: Fixed,
    was_on_ground: bool,
    geometry: &WorldGeometry,
    params: &CollisionParams,
) -> Resolution {
    let mut bounds = *proposed;
    let mut velocity_y = dy;
    let mut on_ground = was_on_ground;
    let mut landed_on = None;

    // 1. Landing: crossed a top edge from strictly above this tick
    let mut best: Option<(usize, Fixed)> = None;
    for (index, geo) in geometry.rects().iter().enumerate() {
        let top = geo.rect.top();
        let crossed = prev.bottom() < top && bounds.bottom() >= top;
        if crossed && bounds.overlaps_horizontally(&geo.rect, params.landing_padding) {
            match best {
                Some((_, line)) if line <= top => {}
                _ => best = Some((index, top)),
            }
        }
    }

    if let Some((index, line)) = best {
        if line <= params.floor_y {
            bounds.y = line.wrapping_sub(bounds.height);
            velocity_y = 0;
            on_ground = true;
            landed_on = Some(Surface::Geometry(index));
        }
    }

    // 2. Side blocking against obstacles
    let mut blocked_by = None;
    if dx != 0 {
        for (index, geo) in geometry.rects().iter().enumerate() {
            if !geo.kind.blocks_sideways() {
                continue;
            }
            let obstacle = &geo.rect;
            if !bounds.overlaps_vertically(obstacle, params.side_tolerance)
                || !bounds.overlaps_horizontally(obstacle, 0)
            {
                continue;
            }

            if dx > 0 && prev.right() <= obstacle.left() {
                bounds.x = fixed_min(bounds.x, obstacle.left().wrapping_sub(bounds.width));
                blocked_by = Some(index);
            } else if dx < 0 && prev.left() >= obstacle.right() {
                bounds.x = fixed_max(bounds.x, obstacle.right());
                blocked_by = Some(index);
            }
        }
    }

    // 3. World floor
    if bounds.bottom() >= params.floor_y {
        bounds.y = params.floor_y.wrapping_sub(bounds.height);
        velocity_y = 0;
        on_ground = true;
        landed_on = landed_on.or(Some(Surface::WorldFloor));
    }

    // Already grounded: the passes above only re-snap
    if was_on_ground {
        landed_on = None;
    }

    Resolution {
        position: bounds.position(),
        velocity_y,
        on_ground,
        landed_on,
        blocked_by,
    }
}

/// Floor line currently supporting a grounded player, if any.
///
/// A line supports the player when the bottom edge lies within
/// `SUPPORT_EPSILON` of it and the padded horizontal spans overlap. The
/// highest supporting line wins.
pub fn find_support(
    bounds: &FixedRect,
    geometry: &WorldGeometry,
    params: &CollisionParams,
) -> Option<Fixed> {
    let bottom = bounds.bottom();

    let tiles = geometry
        .rects()
        .iter()
        .filter(|geo| geo.rect.top() <= params.floor_y)
        .filter(|geo| fixed_abs(bottom.wrapping_sub(geo.rect.top())) <= SUPPORT_EPSILON)
        .filter(|geo| bounds.overlaps_horizontally(&geo.rect, params.landing_padding))
        .map(|geo| geo.rect.top())
        .min();

    tiles.or_else(|| {
        (bottom >= params.floor_y.wrapping_sub(SUPPORT_EPSILON)).then_some(params.floor_y)
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{FIXED_ONE, LANDING_PADDING, SIDE_TOLERANCE};
    use crate::game::level::{GeometryKind, GeometryRect};

    fn px(v: i32) -> Fixed {
        v * FIXED_ONE
    }

    fn rect(x: i32, y: i32, w: i32, h: i32) -> FixedRect {
        FixedRect::new(px(x), px(y), px(w), px(h))
    }

    fn ground(x: i32, y: i32, w: i32, h: i32) -> GeometryRect {
        GeometryRect { rect: rect(x, y, w, h), kind: GeometryKind::Ground { layer: 0 } }
    }

    fn obstacle(x: i32, y: i32, w: i32, h: i32) -> GeometryRect {
        GeometryRect { rect: rect(x, y, w, h), kind: GeometryKind::Obstacle }
    }

    fn params() -> CollisionParams {
        CollisionParams {
            landing_padding: LANDING_PADDING,
            side_tolerance: SIDE_TOLERANCE,
            floor_y: px(700),
        }
    }

    fn fall(prev: FixedRect, dy: i32, geometry: &WorldGeometry) -> Resolution {
        let mut proposed = prev;
        proposed.y += px(dy);
        resolve(&prev, &proposed, 0, px(dy), false, geometry, &params())
    }

    #[test]
    fn test_lands_on_platform() {
        let geometry = WorldGeometry::from_rects(vec![ground(0, 500, 400, 20)]);
        let res = fall(rect(100, 360, 128, 128), 15, &geometry);

        assert!(res.on_ground);
        assert_eq!(res.velocity_y, 0);
        assert_eq!(res.position.y, px(500 - 128));
        assert_eq!(res.landed_on, Some(Surface::Geometry(0)));
    }

    #[test]
    fn test_fast_fall_does_not_tunnel_thin_platform() {
        // 40 px drop across a 2 px platform
        let geometry = WorldGeometry::from_rects(vec![ground(0, 500, 400, 2)]);
        let res = fall(rect(100, 350, 128, 128), 40, &geometry);
        assert_eq!(res.landed_on, Some(Surface::Geometry(0)));
        assert_eq!(res.position.y, px(372));
    }

    #[test]
    fn test_rising_through_platform_is_not_a_landing() {
        let geometry = WorldGeometry::from_rects(vec![ground(0, 500, 400, 20)]);
        // Bottom starts inside the platform and moves up
        let res = fall(rect(100, 380, 128, 128), -15, &geometry);
        assert!(!res.on_ground);
        assert_eq!(res.landed_on, None);
    }

    #[test]
    fn test_highest_line_wins_regardless_of_order() {
        let lower_first = WorldGeometry::from_rects(vec![
            ground(0, 520, 400, 20),
            ground(0, 505, 400, 20),
        ]);
        let res = fall(rect(100, 360, 128, 128), 40, &lower_first);
        assert_eq!(res.position.y, px(505 - 128));
        assert_eq!(res.landed_on, Some(Surface::Geometry(1)));
    }

    #[test]
    fn test_edge_grazing_is_ignored() {
        // Player overlaps the tile by 5 px, less than the 8 px padding
        let geometry = WorldGeometry::from_rects(vec![ground(0, 500, 105, 20)]);
        let res = fall(rect(100, 360, 128, 128), 15, &geometry);
        assert_eq!(res.landed_on, None);
        assert!(!res.on_ground);
    }

    #[test]
    fn test_world_floor_fallback() {
        let geometry = WorldGeometry::default();
        let res = fall(rect(100, 560, 128, 128), 20, &geometry);
        assert!(res.on_ground);
        assert_eq!(res.velocity_y, 0);
        assert_eq!(res.position.y, px(700 - 128));
        assert_eq!(res.landed_on, Some(Surface::WorldFloor));
    }

    #[test]
    fn test_grounded_player_does_not_land_again() {
        let geometry = WorldGeometry::default();
        let prev = rect(100, 572, 128, 128);
        let res = resolve(&prev, &prev, 0, 0, true, &geometry, &params());
        assert!(res.on_ground);
        assert_eq!(res.landed_on, None);
    }

    #[test]
    fn test_side_block_moving_right() {
        let geometry = WorldGeometry::from_rects(vec![obstacle(500, 620, 80, 80)]);
        let prev = rect(370, 572, 128, 128);
        let mut proposed = prev;
        proposed.x += px(4);

        let res = resolve(&prev, &proposed, px(4), 0, true, &geometry, &params());
        assert_eq!(res.position.x, px(500 - 128));
        assert_eq!(res.blocked_by, Some(0));
    }

    #[test]
    fn test_side_block_moving_left() {
        let geometry = WorldGeometry::from_rects(vec![obstacle(100, 620, 80, 80)]);
        let prev = rect(182, 572, 128, 128);
        let mut proposed = prev;
        proposed.x -= px(3);

        let res = resolve(&prev, &proposed, -px(3), 0, true, &geometry, &params());
        assert_eq!(res.position.x, px(180));
        assert!(res.blocked());
    }

    #[test]
    fn test_standing_on_obstacle_is_not_blocked() {
        let geometry = WorldGeometry::from_rects(vec![obstacle(500, 620, 80, 80)]);
        // Resting on top of the obstacle, walking right across it
        let prev = rect(480, 492, 128, 128);
        let mut proposed = prev;
        proposed.x += px(3);

        let res = resolve(&prev, &proposed, px(3), 0, true, &geometry, &params());
        assert_eq!(res.position.x, px(483));
        assert!(!res.blocked());
    }

    #[test]
    fn test_ground_tiles_never_block_sideways() {
        let geometry = WorldGeometry::from_rects(vec![ground(500, 620, 80, 80)]);
        let prev = rect(370, 572, 128, 128);
        let mut proposed = prev;
        proposed.x += px(4);

        let res = resolve(&prev, &proposed, px(4), 0, true, &geometry, &params());
        assert_eq!(res.position.x, px(374));
    }

    #[test]
    fn test_find_support() {
        let geometry = WorldGeometry::from_rects(vec![ground(0, 500, 300, 20)]);

        assert_eq!(find_support(&rect(100, 372, 128, 128), &geometry, &params()), Some(px(500)));
        // Walked off the right edge: only 4 px still over the tile
        assert_eq!(find_support(&rect(296, 372, 128, 128), &geometry, &params()), None);
        // Resting on the world floor
        assert_eq!(find_support(&rect(100, 572, 128, 128), &geometry, &params()), Some(px(700)));
        // A rounding error of a few raw units still counts
        let mut nudged = rect(100, 372, 128, 128);
        nudged.y -= 3;
        assert_eq!(find_support(&nudged, &geometry, &params()), Some(px(500)));
    }
}
