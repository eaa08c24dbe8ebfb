//! Level Description and World Geometry
//!
//! A level is described in unscaled pixels (usually loaded from JSON) and
//! validated before a simulation is built from it. Validation failures are
//! configuration errors: the simulation refuses to start.

use std::path::Path;
use serde::{Serialize, Deserialize};
use tracing::info;

use crate::core::fixed::{Fixed, FIXED_LIMIT, FIXED_ONE, fits_fixed, fixed_mul_checked, to_fixed, to_float};
use crate::core::rect::FixedRect;
use crate::game::animation::AnimationTable;
use crate::game::tick::PhysicsDescription;

// =============================================================================
// ERRORS
// =============================================================================

/// Level configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    /// A rectangle has a non-positive (or non-finite) width or height.
    #[error("{kind} #{index} has non-positive size {width}x{height}")]
    NonPositiveSize {
        /// Which list the rectangle came from
        kind: String,
        /// Position within that list
        index: usize,
        /// Declared width
        width: f64,
        /// Declared height
        height: f64,
    },

    /// A value does not fit the simulation's coordinate range.
    #[error("{field} = {value} is outside the supported coordinate range")]
    OutOfRange {
        /// Offending field
        field: String,
        /// Offending value
        value: f64,
    },

    /// Viewport dimensions must be positive.
    #[error("viewport {width}x{height} must have positive dimensions")]
    InvalidViewport {
        /// Declared width
        width: f64,
        /// Declared height
        height: f64,
    },

    /// Scale factor must be positive.
    #[error("scale factor {0} must be positive")]
    InvalidScale(f64),

    /// Background tile width must be positive.
    #[error("background width {0} must be positive")]
    InvalidBackgroundWidth(f64),

    /// Scroll range must be non-negative.
    #[error("scroll range {0} must not be negative")]
    InvalidScrollRange(f64),

    /// A ground tile and an obstacle occupy the same space.
    #[error("ground layer {layer} tile #{tile} overlaps obstacle #{obstacle}")]
    ContradictoryLayers {
        /// Tile layer index
        layer: usize,
        /// Tile index within the layer
        tile: usize,
        /// Obstacle index
        obstacle: usize,
    },

    /// An animation clip cannot be played.
    #[error("animation clip {clip}: {reason}")]
    InvalidAnimation {
        /// Clip name
        clip: &'static str,
        /// What is wrong with it
        reason: &'static str,
    },

    /// A physics override is unusable.
    #[error("physics.{field} = {value} is invalid")]
    InvalidPhysics {
        /// Offending field
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// The level file could not be read.
    #[error("Failed to read level file {path}: {source}")]
    Io {
        /// Path that failed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The level JSON is malformed.
    #[error("Failed to parse level: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Convert an unscaled pixel value to fixed-point at the given scale.
pub(crate) fn scaled_px(field: &str, value: f64, scale: f64) -> Result<Fixed, LevelError> {
    let scaled = value * scale;
    if !fits_fixed(scaled) {
        return Err(LevelError::OutOfRange {
            field: field.to_string(),
            value,
        });
    }
    Ok(to_fixed(scaled))
}

// =============================================================================
// DESCRIPTION (serde, unscaled pixels)
// =============================================================================

/// Width/height pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizeDescription {
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

/// Point in unscaled level pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointDescription {
    /// X in pixels
    pub x: f64,
    /// Y in pixels
    pub y: f64,
}

/// Rectangle in unscaled level pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectDescription {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl RectDescription {
    /// Shorthand constructor.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    fn has_positive_size(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    fn interiors_overlap(&self, other: &RectDescription) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    fn to_rect(self, field: &str, scale: f64) -> Result<FixedRect, LevelError> {
        // Derived edges must be representable too
        scaled_px(field, self.x + self.width, scale)?;
        scaled_px(field, self.y + self.height, scale)?;
        Ok(FixedRect::new(
            scaled_px(field, self.x, scale)?,
            scaled_px(field, self.y, scale)?,
            scaled_px(field, self.width, scale)?,
            scaled_px(field, self.height, scale)?,
        ))
    }
}

/// One ordered layer of ground tiles.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TileLayerDescription {
    /// Optional label for logs
    #[serde(default)]
    pub name: Option<String>,
    /// Tiles in draw order
    pub rects: Vec<RectDescription>,
}

fn default_scale() -> f64 {
    1.0
}

fn default_spawn() -> PointDescription {
    PointDescription { x: 100.0, y: 0.0 }
}

fn default_player_size() -> SizeDescription {
    SizeDescription { width: 128.0, height: 128.0 }
}

/// Complete level description consumed by the world-build boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelDescription {
    /// Viewport size in screen pixels (not scaled)
    pub viewport: SizeDescription,

    /// Scale factor applied to every level coordinate and the player size
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Width of one background tile (drawn twice, back to back)
    pub background_width: f64,

    /// Absolute floor line the player can never fall below
    pub world_floor_y: f64,

    /// Total distance the world may scroll (defaults to one background width)
    #[serde(default)]
    pub scroll_range: Option<f64>,

    /// Player spawn (top-left of the bounding box)
    #[serde(default = "default_spawn")]
    pub spawn: PointDescription,

    /// Player bounding box before scaling
    #[serde(default = "default_player_size")]
    pub player_size: SizeDescription,

    /// Ground tiles grouped by layer, in order
    #[serde(default)]
    pub tile_layers: Vec<TileLayerDescription>,

    /// Obstacles that block horizontal movement, in order
    #[serde(default)]
    pub obstacles: Vec<RectDescription>,

    /// Physics overrides
    #[serde(default)]
    pub physics: PhysicsDescription,

    /// Animation table
    #[serde(default)]
    pub animations: AnimationTable,
}

impl LevelDescription {
    /// Built-in demo level: a ground strip, two platforms and one crate.
    pub fn demo() -> Self {
        let ground = (0..6)
            .map(|i| RectDescription::new(i as f64 * 400.0, 750.0, 400.0, 150.0))
            .collect();

        Self {
            viewport: SizeDescription { width: 1600.0, height: 900.0 },
            scale: 1.0,
            background_width: 1600.0,
            world_floor_y: 750.0,
            scroll_range: None,
            spawn: PointDescription { x: 100.0, y: 600.0 },
            player_size: default_player_size(),
            tile_layers: vec![
                TileLayerDescription { name: Some("ground".into()), rects: ground },
                TileLayerDescription {
                    name: Some("platforms".into()),
                    rects: vec![
                        RectDescription::new(650.0, 560.0, 220.0, 24.0),
                        RectDescription::new(1250.0, 470.0, 180.0, 24.0),
                    ],
                },
            ],
            obstacles: vec![RectDescription::new(1050.0, 670.0, 80.0, 80.0)],
            physics: PhysicsDescription::default(),
            animations: AnimationTable::default(),
        }
    }

    /// Parse a level from JSON text and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, LevelError> {
        let level: Self = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    /// Load a level from a JSON file and validate it.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Effective scroll range in unscaled pixels.
    pub fn effective_scroll_range(&self) -> f64 {
        self.scroll_range.unwrap_or(self.background_width)
    }

    /// Validate every configuration rule.
    pub fn validate(&self) -> Result<(), LevelError> {
        validate_viewport(self.viewport.width, self.viewport.height)?;
        validate_scale(self.scale)?;

        if !(self.background_width.is_finite() && self.background_width > 0.0) {
            return Err(LevelError::InvalidBackgroundWidth(self.background_width));
        }
        let range = self.effective_scroll_range();
        if !(range.is_finite() && range >= 0.0) {
            return Err(LevelError::InvalidScrollRange(range));
        }

        let player = self.player_size;
        if !(player.width.is_finite() && player.height.is_finite())
            || player.width <= 0.0
            || player.height <= 0.0
        {
            return Err(LevelError::NonPositiveSize {
                kind: "player".into(),
                index: 0,
                width: player.width,
                height: player.height,
            });
        }

        for (layer, tiles) in self.tile_layers.iter().enumerate() {
            for (index, rect) in tiles.rects.iter().enumerate() {
                if !rect.has_positive_size() {
                    return Err(LevelError::NonPositiveSize {
                        kind: format!("tile layer {}", layer),
                        index,
                        width: rect.width,
                        height: rect.height,
                    });
                }
            }
        }
        for (index, rect) in self.obstacles.iter().enumerate() {
            if !rect.has_positive_size() {
                return Err(LevelError::NonPositiveSize {
                    kind: "obstacle".into(),
                    index,
                    width: rect.width,
                    height: rect.height,
                });
            }
        }

        for (layer, tiles) in self.tile_layers.iter().enumerate() {
            for (tile, rect) in tiles.rects.iter().enumerate() {
                if let Some(obstacle) = self.obstacles.iter().position(|o| o.interiors_overlap(rect)) {
                    return Err(LevelError::ContradictoryLayers { layer, tile, obstacle });
                }
            }
        }

        self.physics.validate()?;
        self.animations.validate()?;

        // Range checks happen on the scaled values the simulation will use
        let geometry = WorldGeometry::from_description(self)?;
        scaled_px("background_width", self.background_width, self.scale)?;
        scaled_px("world_floor_y", self.world_floor_y, self.scale)?;
        geometry.check_scroll(scaled_px("scroll_range", range, self.scale)?)?;
        scaled_px("spawn.x", self.spawn.x, self.scale)?;
        scaled_px("spawn.y", self.spawn.y, self.scale)?;
        scaled_px("player_size.width", player.width, self.scale)?;
        scaled_px("player_size.height", player.height, self.scale)?;

        Ok(())
    }
}

/// Viewport dimensions must be positive and representable.
pub(crate) fn validate_viewport(width: f64, height: f64) -> Result<(), LevelError> {
    if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
        return Err(LevelError::InvalidViewport { width, height });
    }
    scaled_px("viewport.width", width, 1.0)?;
    scaled_px("viewport.height", height, 1.0)?;
    Ok(())
}

/// Scale factor must be positive and representable.
pub(crate) fn validate_scale(scale: f64) -> Result<(), LevelError> {
    if !(scale.is_finite() && scale > 0.0) || to_fixed(scale) <= 0 {
        return Err(LevelError::InvalidScale(scale));
    }
    scaled_px("scale", scale, 1.0)?;
    Ok(())
}

// =============================================================================
// WORLD GEOMETRY (fixed-point, scaled)
// =============================================================================

/// Layer tag of a static rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    /// Ground tile from the given tile layer (landable)
    Ground {
        /// Index of the tile layer
        layer: u16,
    },
    /// Obstacle (landable, blocks horizontal movement)
    Obstacle,
}

impl GeometryKind {
    /// Check if this rectangle blocks horizontal movement.
    #[inline]
    pub fn blocks_sideways(self) -> bool {
        matches!(self, GeometryKind::Obstacle)
    }
}

/// Static axis-aligned rectangle of the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryRect {
    /// Bounds in current (scaled, scrolled) screen space
    pub rect: FixedRect,
    /// Layer tag
    pub kind: GeometryKind,
}

/// Ordered static geometry of the current level segment.
///
/// The only mutation after build is a uniform horizontal translation
/// (scrolling) or a uniform rescale (viewport resize).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldGeometry {
    rects: Vec<GeometryRect>,
}

impl WorldGeometry {
    /// Build scaled geometry from a description: tile layers first, in
    /// order, then obstacles.
    pub fn from_description(level: &LevelDescription) -> Result<Self, LevelError> {
        let mut rects = Vec::new();

        for (layer, tiles) in level.tile_layers.iter().enumerate() {
            let field = format!("tile_layers[{}]", layer);
            for rect in &tiles.rects {
                rects.push(GeometryRect {
                    rect: rect.to_rect(&field, level.scale)?,
                    kind: GeometryKind::Ground { layer: layer as u16 },
                });
            }
        }
        for rect in &level.obstacles {
            rects.push(GeometryRect {
                rect: rect.to_rect("obstacles", level.scale)?,
                kind: GeometryKind::Obstacle,
            });
        }

        Ok(Self { rects })
    }

    /// Create geometry directly from rectangles (tests and tools).
    pub fn from_rects(rects: Vec<GeometryRect>) -> Self {
        Self { rects }
    }

    /// All rectangles in order.
    pub fn rects(&self) -> &[GeometryRect] {
        &self.rects
    }

    /// Number of rectangles.
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Check if the level has no geometry.
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Translate every rectangle horizontally by the same amount.
    pub fn translate_x(&mut self, dx: Fixed) {
        for geo in &mut self.rects {
            geo.rect.translate_x(dx);
        }
    }

    /// Check that every rectangle stays inside the coordinate range when
    /// the world scrolls left by up to `scroll`.
    ///
    /// Right edges are already range-checked and only move left, so the
    /// left edge after the full scroll is the value at risk.
    pub fn check_scroll(&self, scroll: Fixed) -> Result<(), LevelError> {
        let limit = i64::from(to_fixed(FIXED_LIMIT));
        for (index, geo) in self.rects.iter().enumerate() {
            let left = i64::from(geo.rect.x) - i64::from(scroll);
            if left.abs() > limit {
                return Err(LevelError::OutOfRange {
                    field: format!("geometry[{}].x after scrolling", index),
                    value: left as f64 / f64::from(FIXED_ONE),
                });
            }
        }
        Ok(())
    }

    /// Rescale every rectangle by `ratio`.
    ///
    /// Leaves the geometry untouched and returns an error if any value
    /// would leave the coordinate range.
    pub fn rescale(&mut self, ratio: Fixed) -> Result<(), LevelError> {
        let mut scaled = Vec::with_capacity(self.rects.len());
        for (index, geo) in self.rects.iter().enumerate() {
            let r = geo.rect;
            let fields = [r.x, r.y, r.width, r.height, r.right(), r.bottom()];
            if let Some(&v) = fields.iter().find(|v| fixed_mul_checked(**v, ratio).is_none()) {
                return Err(LevelError::OutOfRange {
                    field: format!("geometry[{}]", index),
                    value: f64::from(to_float(v)) * f64::from(to_float(ratio)),
                });
            }
            scaled.push(GeometryRect { rect: r.scaled(ratio), kind: geo.kind });
        }
        self.rects = scaled;
        info!(rects = self.rects.len(), "rescaled world geometry");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::FIXED_ONE;

    fn minimal() -> LevelDescription {
        LevelDescription {
            viewport: SizeDescription { width: 1200.0, height: 800.0 },
            scale: 1.0,
            background_width: 900.0,
            world_floor_y: 700.0,
            scroll_range: None,
            spawn: PointDescription { x: 0.0, y: 572.0 },
            player_size: default_player_size(),
            tile_layers: Vec::new(),
            obstacles: Vec::new(),
            physics: PhysicsDescription::default(),
            animations: AnimationTable::default(),
        }
    }

    #[test]
    fn test_demo_level_is_valid() {
        let demo = LevelDescription::demo();
        demo.validate().unwrap();
        let geometry = WorldGeometry::from_description(&demo).unwrap();
        assert_eq!(geometry.len(), 6 + 2 + 1);
        // Tile layers come first, obstacles last
        assert_eq!(geometry.rects()[0].kind, GeometryKind::Ground { layer: 0 });
        assert_eq!(geometry.rects()[6].kind, GeometryKind::Ground { layer: 1 });
        assert_eq!(geometry.rects()[8].kind, GeometryKind::Obstacle);
    }

    #[test]
    fn test_rejects_non_positive_tile() {
        let mut level = minimal();
        level.tile_layers.push(TileLayerDescription {
            name: None,
            rects: vec![RectDescription::new(0.0, 700.0, 0.0, 10.0)],
        });
        assert!(matches!(
            level.validate(),
            Err(LevelError::NonPositiveSize { index: 0, .. })
        ));
    }

    #[test]
    fn test_rejects_negative_obstacle() {
        let mut level = minimal();
        level.obstacles.push(RectDescription::new(10.0, 10.0, 10.0, 10.0));
        level.obstacles.push(RectDescription::new(500.0, 600.0, 50.0, -5.0));
        match level.validate() {
            Err(LevelError::NonPositiveSize { kind, index, .. }) => {
                assert_eq!(kind, "obstacle");
                assert_eq!(index, 1);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_contradictory_layers() {
        let mut level = minimal();
        level.tile_layers.push(TileLayerDescription {
            name: None,
            rects: vec![RectDescription::new(0.0, 700.0, 400.0, 100.0)],
        });
        // Sitting on top of the tile is fine
        level.obstacles.push(RectDescription::new(100.0, 620.0, 80.0, 80.0));
        level.validate().unwrap();

        // Sunk into the tile is contradictory
        level.obstacles.push(RectDescription::new(300.0, 650.0, 80.0, 80.0));
        assert!(matches!(
            level.validate(),
            Err(LevelError::ContradictoryLayers { layer: 0, tile: 0, obstacle: 1 })
        ));
    }

    #[test]
    fn test_rejects_bad_scalars() {
        let mut level = minimal();
        level.scale = 0.0;
        assert!(matches!(level.validate(), Err(LevelError::InvalidScale(_))));

        let mut level = minimal();
        level.background_width = -1.0;
        assert!(matches!(level.validate(), Err(LevelError::InvalidBackgroundWidth(_))));

        let mut level = minimal();
        level.viewport.height = 0.0;
        assert!(matches!(level.validate(), Err(LevelError::InvalidViewport { .. })));

        let mut level = minimal();
        level.scroll_range = Some(-10.0);
        assert!(matches!(level.validate(), Err(LevelError::InvalidScrollRange(_))));
    }

    #[test]
    fn test_rejects_out_of_range_after_scaling() {
        let mut level = minimal();
        level.obstacles.push(RectDescription::new(20000.0, 600.0, 50.0, 50.0));
        level.validate().unwrap();

        level.scale = 2.0;
        assert!(matches!(level.validate(), Err(LevelError::OutOfRange { .. })));
    }

    #[test]
    fn test_rejects_edge_overflow() {
        // Each field fits on its own, but the right edge does not
        let mut level = minimal();
        level.tile_layers.push(TileLayerDescription {
            name: None,
            rects: vec![RectDescription::new(100.0, 600.0, 32700.0, 50.0)],
        });
        assert!(matches!(level.validate(), Err(LevelError::OutOfRange { .. })));

        let mut level = minimal();
        level.obstacles.push(RectDescription::new(0.0, 32700.0, 10.0, 100.0));
        assert!(matches!(level.validate(), Err(LevelError::OutOfRange { .. })));
    }

    #[test]
    fn test_rejects_geometry_scrolled_out_of_range() {
        let mut level = minimal();
        level.tile_layers.push(TileLayerDescription {
            name: None,
            rects: vec![RectDescription::new(-20000.0, 600.0, 30000.0, 50.0)],
        });
        level.scroll_range = Some(12000.0);
        level.validate().unwrap();

        level.scroll_range = Some(20000.0);
        match level.validate() {
            Err(LevelError::OutOfRange { field, value }) => {
                assert_eq!(field, "geometry[0].x after scrolling");
                assert_eq!(value, -40000.0);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_rescale_error_reports_scaled_value() {
        let mut geometry = WorldGeometry::from_rects(vec![GeometryRect {
            rect: FixedRect::new(20000 * FIXED_ONE, 0, FIXED_ONE, FIXED_ONE),
            kind: GeometryKind::Obstacle,
        }]);
        match geometry.rescale(2 * FIXED_ONE) {
            Err(LevelError::OutOfRange { value, .. }) => assert_eq!(value, 40000.0),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_from_json_with_defaults() {
        let json = r#"{
            "viewport": { "width": 1280, "height": 720 },
            "background_width": 1280,
            "world_floor_y": 600,
            "obstacles": [ { "x": 500, "y": 520, "width": 80, "height": 80 } ]
        }"#;
        let level = LevelDescription::from_json_str(json).unwrap();
        assert_eq!(level.scale, 1.0);
        assert_eq!(level.effective_scroll_range(), 1280.0);
        assert_eq!(level.player_size.width, 128.0);
        assert_eq!(level.obstacles.len(), 1);
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        assert!(matches!(
            LevelDescription::from_json_str("{ not json"),
            Err(LevelError::Parse(_))
        ));
        let json = r#"{
            "viewport": { "width": 1280, "height": 720 },
            "background_width": 1280,
            "world_floor_y": 600,
            "obstacles": [ { "x": 500, "y": 520, "width": 0, "height": 80 } ]
        }"#;
        assert!(matches!(
            LevelDescription::from_json_str(json),
            Err(LevelError::NonPositiveSize { .. })
        ));
    }

    #[test]
    fn test_from_path_missing_file() {
        assert!(matches!(
            LevelDescription::from_path("/definitely/not/here.json"),
            Err(LevelError::Io { .. })
        ));
    }

    #[test]
    fn test_geometry_scaled_and_translated() {
        let mut level = minimal();
        level.scale = 2.0;
        level.obstacles.push(RectDescription::new(100.0, 300.0, 40.0, 20.0));
        let mut geometry = WorldGeometry::from_description(&level).unwrap();
        assert_eq!(
            geometry.rects()[0].rect,
            FixedRect::new(200 * FIXED_ONE, 600 * FIXED_ONE, 80 * FIXED_ONE, 40 * FIXED_ONE)
        );

        geometry.translate_x(-5 * FIXED_ONE);
        assert_eq!(geometry.rects()[0].rect.x, 195 * FIXED_ONE);

        geometry.rescale(FIXED_ONE / 2).unwrap();
        assert_eq!(geometry.rects()[0].rect.width, 40 * FIXED_ONE);
    }

    #[test]
    fn test_rescale_overflow_leaves_geometry_untouched() {
        let mut geometry = WorldGeometry::from_rects(vec![GeometryRect {
            rect: FixedRect::new(20000 * FIXED_ONE, 0, FIXED_ONE, FIXED_ONE),
            kind: GeometryKind::Obstacle,
        }]);
        let before = geometry.clone();
        assert!(geometry.rescale(2 * FIXED_ONE).is_err());
        assert_eq!(geometry, before);
    }
}
