//! Track Map
//!
//! Rasterized occupancy grid built once per track load, plus the
//! start/finish geometry. Read-only for the rest of the simulation.

use image::RgbImage;
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, StartLineConfig, StartPointConfig, TrackConfig};
use crate::core::geometry::{normalize_angle, to_radians, Segment};
use crate::core::vec2::Vec2;

/// Pixel color that marks a wall cell.
pub const WALL_COLOR: [u8; 3] = [0, 0, 0];

/// A grid query landed outside the raster.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("point ({x:.2}, {y:.2}) is outside the {width}x{height} track")]
pub struct OutOfBounds {
    /// Queried X
    pub x: f64,
    /// Queried Y
    pub y: f64,
    /// Track width
    pub width: u32,
    /// Track height
    pub height: u32,
}

/// Boolean occupancy grid with start/finish geometry.
#[derive(Clone, Debug)]
pub struct TrackMap {
    width: u32,
    height: u32,
    /// Row-major, `true` = wall / off-track
    occupancy: Vec<bool>,
    start_line: Segment,
    start_point: Vec2,
    initial_heading: f64,
}

impl TrackMap {
    /// Threshold an RGB raster into an occupancy grid.
    ///
    /// A pixel is a wall iff it is exactly `WALL_COLOR`.
    pub fn build(
        image: &RgbImage,
        start_line: Option<StartLineConfig>,
        start_point: Option<StartPointConfig>,
    ) -> Result<Self, ConfigError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyImage { width, height });
        }
        let start_line = start_line
            .ok_or(ConfigError::MissingStartGeometry("start line"))?
            .segment();
        let start_pose = start_point.ok_or(ConfigError::MissingStartGeometry("start point"))?;

        let occupancy = image.pixels().map(|px| px.0 == WALL_COLOR).collect();
        let start_point = Vec2::new(start_pose.x, start_pose.y);
        let initial_heading =
            compute_initial_heading(&start_line, start_point, start_pose.heading_degrees);

        Ok(Self {
            width,
            height,
            occupancy,
            start_line,
            start_point,
            initial_heading,
        })
    }

    /// Decode the configured image and build the map.
    pub fn from_config(config: &TrackConfig) -> Result<Self, ConfigError> {
        let start_line = config.require_start_line()?;
        let start_point = config.require_start_point()?;
        let image = config.load_image()?;
        let map = Self::build(&image, Some(start_line), Some(start_point))?;

        info!(
            "Loaded track {} ({}x{}, {} wall cells, initial heading {:.1} deg)",
            config.image_url,
            map.width,
            map.height,
            map.wall_count(),
            map.initial_heading.to_degrees()
        );
        Ok(map)
    }

    /// Raster width in cells.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Raster height in cells.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the cell containing `(x, y)` is a wall.
    ///
    /// Coordinates are floored to cell indices.
    pub fn is_wall(&self, x: f64, y: f64) -> Result<bool, OutOfBounds> {
        let (cx, cy) = (x.floor(), y.floor());
        if !(cx >= 0.0 && cy >= 0.0 && cx < self.width as f64 && cy < self.height as f64) {
            return Err(OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        let index = cy as usize * self.width as usize + cx as usize;
        Ok(self.occupancy[index])
    }

    /// `is_wall` with anything outside the raster treated as wall.
    #[inline]
    pub fn is_blocked(&self, point: Vec2) -> bool {
        self.is_wall(point.x, point.y).unwrap_or(true)
    }

    /// Canonical "track forward" heading in `[0, 2*PI)`.
    #[inline]
    pub fn initial_heading(&self) -> f64 {
        self.initial_heading
    }

    /// Start/finish line.
    #[inline]
    pub fn start_line(&self) -> &Segment {
        &self.start_line
    }

    /// Spawn position.
    #[inline]
    pub fn start_point(&self) -> Vec2 {
        self.start_point
    }

    /// Whether segment `a`-`b` crosses the start line.
    ///
    /// Parallel (including collinear overlapping) segments do not cross.
    #[inline]
    pub fn segment_intersects_start_line(&self, a: Vec2, b: Vec2) -> bool {
        Segment::new(a, b).intersects(&self.start_line)
    }

    /// Length of the raster diagonal; no ray on the map can be longer.
    #[inline]
    pub fn diagonal(&self) -> f64 {
        (self.width as f64).hypot(self.height as f64)
    }

    /// Number of wall cells.
    pub fn wall_count(&self) -> usize {
        self.occupancy.iter().filter(|&&wall| wall).count()
    }
}

/// Heading pointing from the start point toward the start line's midpoint.
///
/// Falls back to the configured heading when the two coincide.
fn compute_initial_heading(start_line: &Segment, start_point: Vec2, fallback_degrees: f64) -> f64 {
    let toward = start_line.midpoint().sub(start_point);
    if toward.is_zero() {
        return normalize_angle(to_radians(fallback_degrees));
    }
    // atan2 measures from +X; heading 0 is -Y, a quarter turn earlier
    normalize_angle(toward.y.atan2(toward.x) + std::f64::consts::FRAC_PI_2)
}
