//! Core geometric primitives.
//!
//! Plain float geometry in raster (pixel) coordinates. Everything the
//! simulation measures is built from these two modules.

pub mod vec2;
pub mod geometry;

// Re-export core types
pub use vec2::Vec2;
pub use geometry::{Segment, normalize_angle, angle_between, to_radians};
