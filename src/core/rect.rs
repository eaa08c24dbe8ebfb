//! Fixed-Point Axis-Aligned Rectangles
//!
//! Bounding boxes for the player and static level geometry.
//! `position` is the top-left corner; +Y points down the screen.

use std::fmt;
use serde::{Serialize, Deserialize};

use super::fixed::{Fixed, fixed_mul};
use super::vec2::FixedVec2;

/// Axis-aligned rectangle with fixed-point components.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FixedRect {
    /// Left edge
    pub x: Fixed,
    /// Top edge
    pub y: Fixed,
    /// Width (always positive for level geometry)
    pub width: Fixed,
    /// Height (always positive for level geometry)
    pub height: Fixed,
}

impl FixedRect {
    /// Create a rectangle from fixed-point components.
    #[inline]
    pub const fn new(x: Fixed, y: Fixed, width: Fixed, height: Fixed) -> Self {
        Self { x, y, width, height }
    }

    /// Create a rectangle from a top-left corner and a size vector.
    #[inline]
    pub const fn from_pos_size(position: FixedVec2, size: FixedVec2) -> Self {
        Self::new(position.x, position.y, size.x, size.y)
    }

    /// Left edge.
    #[inline]
    pub fn left(&self) -> Fixed {
        self.x
    }

    /// Right edge.
    #[inline]
    pub fn right(&self) -> Fixed {
        self.x.wrapping_add(self.width)
    }

    /// Top edge.
    #[inline]
    pub fn top(&self) -> Fixed {
        self.y
    }

    /// Bottom edge.
    #[inline]
    pub fn bottom(&self) -> Fixed {
        self.y.wrapping_add(self.height)
    }

    /// Top-left corner.
    #[inline]
    pub fn position(&self) -> FixedVec2 {
        FixedVec2::new(self.x, self.y)
    }

    /// Width and height as a vector.
    #[inline]
    pub fn size(&self) -> FixedVec2 {
        FixedVec2::new(self.width, self.height)
    }

    /// Horizontal spans overlap after shrinking `self` by `padding` on both sides.
    ///
    /// Touching edges do not count as overlap.
    #[inline]
    pub fn overlaps_horizontally(&self, other: &FixedRect, padding: Fixed) -> bool {
        self.left() + padding < other.right() && self.right() - padding > other.left()
    }

    /// Vertical spans overlap, ignoring the bottom `tolerance` of `self`.
    #[inline]
    pub fn overlaps_vertically(&self, other: &FixedRect, tolerance: Fixed) -> bool {
        self.top() < other.bottom() && self.bottom() - tolerance > other.top()
    }

    /// Interiors overlap (shared edges are not an overlap).
    #[inline]
    pub fn intersects(&self, other: &FixedRect) -> bool {
        self.overlaps_horizontally(other, 0) && self.overlaps_vertically(other, 0)
    }

    /// Move horizontally by `dx`.
    #[inline]
    pub fn translate_x(&mut self, dx: Fixed) {
        self.x = self.x.wrapping_add(dx);
    }

    /// Scale position and size by a fixed-point ratio.
    #[inline]
    pub fn scaled(&self, ratio: Fixed) -> Self {
        Self {
            x: fixed_mul(self.x, ratio),
            y: fixed_mul(self.y, ratio),
            width: fixed_mul(self.width, ratio),
            height: fixed_mul(self.height, ratio),
        }
    }

    /// Convert to floats `(x, y, width, height)` for rendering.
    #[inline]
    pub fn to_floats(&self) -> (f32, f32, f32, f32) {
        let (x, y) = self.position().to_floats();
        let (w, h) = self.size().to_floats();
        (x, y, w, h)
    }
}

impl fmt::Debug for FixedRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y, w, h) = self.to_floats();
        write!(f, "Rect({:.3}, {:.3}, {:.3}x{:.3})", x, y, w, h)
    }
}

// =============================================================================
// TESTS
// =============================================================================
