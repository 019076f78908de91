//! Planar Geometry Helpers
//!
//! Segment intersection and angle normalization
//! shared by the track, lap and sensor code.

use std::f64::consts::{PI, TAU};

use super::vec2::Vec2;

/// Determinants with magnitude below this are treated as parallel.
pub const PARALLEL_EPSILON: f64 = 1e-9;

/// A line segment between two points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// First endpoint
    pub p1: Vec2,
    /// Second endpoint
    pub p2: Vec2,
}

impl Segment {
    /// Create a segment.
    #[inline]
    pub const fn new(p1: Vec2, p2: Vec2) -> Self {
        Self { p1, p2 }
    }

    /// Segment length.
    #[inline]
    pub fn length(&self) -> f64 {
        self.p1.distance(self.p2)
    }

    /// Midpoint of the segment.
    #[inline]
    pub fn midpoint(&self) -> Vec2 {
        self.p1.midpoint(self.p2)
    }

    /// Parametric intersection test against another segment.
    ///
    /// Returns false for parallel or collinear segments (|det| ~ 0),
    /// including overlapping collinear ones, and for zero-length segments.
    pub fn intersects(&self, other: &Segment) -> bool {
        let (p1, p2) = (self.p1, self.p2);
        let (q1, q2) = (other.p1, other.p2);

        let det = (p2.x - p1.x) * (q2.y - q1.y) - (p2.y - p1.y) * (q2.x - q1.x);
        if det.abs() < PARALLEL_EPSILON {
            return false;
        }

        let lambda = ((q2.y - q1.y) * (q2.x - p1.x) + (q1.x - q2.x) * (q2.y - p1.y)) / det;
        let gamma = ((p1.y - p2.y) * (q2.x - p1.x) + (p2.x - p1.x) * (q2.y - p1.y)) / det;

        (0.0..=1.0).contains(&lambda) && (0.0..=1.0).contains(&gamma)
    }
}

/// Normalize an angle to `[0, 2*PI)`.
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Smallest absolute difference between two angles, in `[0, PI]`.
#[inline]
pub fn angle_between(a: f64, b: f64) -> f64 {
    let diff = (normalize_angle(a) - normalize_angle(b)).abs();
    diff.min(TAU - diff)
}

/// Degrees to radians.
#[inline]
pub fn to_radians(degrees: f64) -> f64 {
    degrees * PI / 180.0
}
