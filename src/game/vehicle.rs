//! Vehicle Kinematics
//!
//! Kinematic state for one vehicle and the oriented box derived from it.
//! Heading 0 points "up" the raster; positive yaw turns clockwise on screen.

use std::fmt;

use serde::{Serialize, Deserialize};

use crate::core::geometry::{normalize_angle, to_radians, Segment};
use crate::core::vec2::Vec2;
use crate::game::lap::LapState;
use crate::game::sensor::{SensorReading, SENSOR_COUNT};

// =============================================================================
// VEHICLE ID
// =============================================================================

/// Vehicle identifier, unique within one simulation.
///
/// Implements Ord for stable BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub u32);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// CONTROL PROFILE
// =============================================================================

/// Per-command control rates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlProfile {
    /// Speed added per "accelerate" (pixels/tick)
    pub accelerate: f64,
    /// Speed removed per "brake" (pixels/tick)
    pub brake: f64,
    /// Yaw rate for full steering lock (degrees/tick)
    pub steer_degrees: f64,
}

impl ControlProfile {
    /// Keyboard driving.
    pub const HUMAN: Self = Self {
        accelerate: 0.5,
        brake: 0.7,
        steer_degrees: 2.2,
    };

    /// Agent driving.
    pub const AGENT: Self = Self {
        accelerate: 0.1,
        brake: 0.3,
        steer_degrees: 1.8,
    };
}

// =============================================================================
// ORIENTED BOX
// =============================================================================

/// Vehicle footprint rotated to its heading.
///
/// Corner order is fixed: front-left, front-right, rear-left, rear-right.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrientedBox {
    /// Corners in fixed order
    pub corners: [Vec2; 4],
}

impl OrientedBox {
    /// Index of the front-left corner
    pub const FRONT_LEFT: usize = 0;
    /// Index of the front-right corner
    pub const FRONT_RIGHT: usize = 1;
    /// Index of the rear-left corner
    pub const REAR_LEFT: usize = 2;
    /// Index of the rear-right corner
    pub const REAR_RIGHT: usize = 3;

    /// Box for a body of `width` x `height` centered at `center`.
    pub fn new(center: Vec2, heading: f64, width: f64, height: f64) -> Self {
        let forward = Vec2::from_heading(heading).scale(height / 2.0);
        // Forward rotated a quarter turn clockwise on screen
        let right = Vec2::new(heading.cos(), heading.sin()).scale(width / 2.0);

        let front = center.add(forward);
        let rear = center.sub(forward);
        Self {
            corners: [
                front.sub(right),
                front.add(right),
                rear.sub(right),
                rear.add(right),
            ],
        }
    }

    /// The box moved by `offset`.
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            corners: self.corners.map(|c| c.add(offset)),
        }
    }

    /// Perimeter edges: front, right side, rear, left side.
    pub fn edges(&self) -> [Segment; 4] {
        let c = &self.corners;
        [
            Segment::new(c[Self::FRONT_LEFT], c[Self::FRONT_RIGHT]),
            Segment::new(c[Self::FRONT_RIGHT], c[Self::REAR_RIGHT]),
            Segment::new(c[Self::REAR_RIGHT], c[Self::REAR_LEFT]),
            Segment::new(c[Self::REAR_LEFT], c[Self::FRONT_LEFT]),
        ]
    }
}

// =============================================================================
// VEHICLE
// =============================================================================

/// State of a single vehicle on the track.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// Identifier
    pub id: VehicleId,

    /// Body width (across the heading)
    pub width: f64,

    /// Body length (along the heading)
    pub height: f64,

    /// Center position
    pub position: Vec2,

    /// Heading in radians, `[0, 2*PI)`
    pub heading: f64,

    /// Signed speed in pixels/tick; negative = reversing
    pub speed: f64,

    /// Angular velocity in degrees/tick
    pub yaw_rate: f64,

    /// Driven by a human rather than the agent
    pub human_controlled: bool,

    /// Last prospective move hit a wall; cleared by the next legal non-zero move
    pub collided: bool,

    /// Start/finish line bookkeeping
    pub lap: LapState,

    /// Latest sensor readings, in fixed offset order
    pub sensors: [SensorReading; SENSOR_COUNT],
}

impl Vehicle {
    /// Create a stationary vehicle at `position` facing `heading`.
    pub fn new(
        id: VehicleId,
        width: f64,
        height: f64,
        position: Vec2,
        heading: f64,
        human_controlled: bool,
    ) -> Self {
        Self {
            id,
            width,
            height,
            position,
            heading: normalize_angle(heading),
            speed: 0.0,
            yaw_rate: 0.0,
            human_controlled,
            collided: false,
            lap: LapState::default(),
            sensors: Default::default(),
        }
    }

    /// Move back to a pose, stopped, with lap and collision state cleared.
    pub fn reset_to(&mut self, position: Vec2, heading: f64) {
        self.stop();
        self.position = position;
        self.heading = normalize_angle(heading);
        self.collided = false;
        self.lap = LapState::default();
    }

    /// Current oriented bounding box.
    #[inline]
    pub fn corners(&self) -> OrientedBox {
        OrientedBox::new(self.position, self.heading, self.width, self.height)
    }

    /// Displacement this vehicle would make this tick.
    #[inline]
    pub fn movement_vector(&self) -> Vec2 {
        Vec2::from_heading(self.heading).scale(self.speed)
    }

    /// Add to speed.
    #[inline]
    pub fn increase_speed(&mut self, amount: f64) {
        self.speed += amount;
    }

    /// Brake, or accelerate in reverse.
    ///
    /// Braking from forward motion stops at zero; once at or below zero,
    /// further braking keeps decreasing speed.
    pub fn decrease_speed(&mut self, amount: f64) {
        if self.speed > 0.0 {
            self.speed = (self.speed - amount).max(0.0);
        } else {
            self.speed -= amount;
        }
    }

    /// Set yaw rate (degrees/tick). A stationary vehicle cannot turn.
    pub fn set_yaw_rate(&mut self, degrees_per_tick: f64) {
        self.yaw_rate = if self.speed == 0.0 { 0.0 } else { degrees_per_tick };
    }

    /// Commit a move, then integrate heading.
    pub fn apply_move(&mut self, vector: Vec2) {
        self.position = self.position.add(vector);
        if self.speed != 0.0 && self.yaw_rate != 0.0 {
            self.heading = normalize_angle(self.heading + to_radians(self.yaw_rate));
        }
    }

    /// Zero speed and yaw rate.
    #[inline]
    pub fn stop(&mut self) {
        self.speed = 0.0;
        self.yaw_rate = 0.0;
    }

    /// Heading of actual travel: flipped while reversing.
    pub fn travel_heading(&self) -> f64 {
        if self.speed < 0.0 {
            normalize_angle(self.heading + std::f64::consts::PI)
        } else {
            self.heading
        }
    }
}
