//! Distance Sensors
//!
//! Fixed-angle rays marched outward from the vehicle center in unit steps
//! until they hit a wall, leave the raster, or reach the range cap.
//! The readings double as the agent's feature vector.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::track::TrackMap;
use crate::game::vehicle::Vehicle;

/// Number of rays per vehicle.
pub const SENSOR_COUNT: usize = 5;

/// Ray offsets relative to heading, left to right.
pub const SENSOR_OFFSETS: [f64; SENSOR_COUNT] = [-FRAC_PI_2, -FRAC_PI_4, 0.0, FRAC_PI_4, FRAC_PI_2];

/// One ray result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Offset from heading (radians)
    pub angle_offset: f64,
    /// Distance marched before stopping (pixels)
    pub distance: f64,
    /// Where the ray stopped
    pub end_point: Vec2,
}

/// Ray caster bound to a range limit.
#[derive(Clone, Copy, Debug, Default)]
pub struct SensorArray {
    max_range: Option<f64>,
}

impl SensorArray {
    /// Sensors limited to `max_range`; `None` is limited by the track itself.
    pub fn new(max_range: Option<f64>) -> Self {
        Self { max_range }
    }

    /// Effective range on `track`.
    ///
    /// Never exceeds the raster diagonal, so a ray always terminates.
    pub fn range_cap(&self, track: &TrackMap) -> f64 {
        let diagonal = track.diagonal();
        match self.max_range {
            Some(range) if range >= 0.0 => range.min(diagonal),
            Some(_) => 0.0,
            None => diagonal,
        }
    }

    /// Cast every ray for `vehicle`, in `SENSOR_OFFSETS` order.
    pub fn cast_all(&self, track: &TrackMap, vehicle: &Vehicle) -> [SensorReading; SENSOR_COUNT] {
        let cap = self.range_cap(track);
        SENSOR_OFFSETS.map(|offset| cast_ray(track, vehicle.position, vehicle.heading, offset, cap))
    }
}

/// March one ray from `origin`.
///
/// A ray stops at the first blocked sample (wall or outside the raster),
/// or at exactly `cap`.
pub fn cast_ray(track: &TrackMap, origin: Vec2, heading: f64, offset: f64, cap: f64) -> SensorReading {
    let direction = Vec2::from_heading(heading + offset);
    let mut distance = 0.0_f64;

    loop {
        let point = origin.add(direction.scale(distance));
        if track.is_blocked(point) || distance >= cap {
            return SensorReading {
                angle_offset: offset,
                distance,
                end_point: point,
            };
        }
        distance = (distance + 1.0).min(cap);
    }
}
