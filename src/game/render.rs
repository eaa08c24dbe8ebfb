//! Render Boundary
//!
//! Read-only, float-valued view of a simulation for an external renderer.
//! This is the only place fixed-point values leave the simulation.

use serde::{Serialize, Deserialize};

use crate::core::fixed::to_float;
use crate::core::rect::FixedRect;
use crate::game::animation::FrameRect;
use crate::game::level::GeometryKind;
use crate::game::player::Facing;
use crate::game::state::Simulation;

/// Rectangle in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectView {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl From<&FixedRect> for RectView {
    fn from(rect: &FixedRect) -> Self {
        let (x, y, width, height) = rect.to_floats();
        Self { x, y, width, height }
    }
}

/// Player pose and sprite selection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSprite {
    /// Left edge on screen
    pub x: f32,
    /// Top edge on screen
    pub y: f32,
    /// Drawn width
    pub width: f32,
    /// Drawn height
    pub height: f32,
    /// Sprite facing (pick or mirror the sheet)
    pub facing: Facing,
    /// Source rectangle in the sprite sheet
    pub frame: FrameRect,
}

/// A level rectangle with its layer tag.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeometryView {
    /// Screen rectangle after scrolling
    pub rect: RectView,
    /// Layer tag
    pub kind: GeometryKind,
}

/// Everything a renderer needs for one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    /// Tick this snapshot was taken after
    pub tick: u32,
    /// Player pose
    pub player: PlayerSprite,
    /// Level rectangles in build order
    pub geometry: Vec<GeometryView>,
    /// Background offset; draw at `offset` and `offset + background_width`
    pub background_offset: f32,
    /// Width of one background copy
    pub background_width: f32,
}

impl RenderSnapshot {
    /// Capture the current state of a simulation.
    pub fn capture(sim: &Simulation) -> Self {
        let body = RectView::from(&sim.player.bounds());
        Self {
            tick: sim.tick,
            player: PlayerSprite {
                x: body.x,
                y: body.y,
                width: body.width,
                height: body.height,
                facing: sim.player.facing,
                frame: sim.player.animation.frame_rect(&sim.animations),
            },
            geometry: sim
                .geometry
                .rects()
                .iter()
                .map(|geo| GeometryView { rect: RectView::from(&geo.rect), kind: geo.kind })
                .collect(),
            background_offset: to_float(sim.scroll.offset),
            background_width: to_float(sim.scroll.background_width),
        }
    }

    /// Screen x of both background copies.
    pub fn background_copies(&self) -> [f32; 2] {
        [self.background_offset, self.background_offset + self.background_width]
    }
}
