//! Wall Collision
//!
//! Tests a prospective move against the occupancy grid before it is
//! committed. Only vehicle-vs-wall contact exists; vehicles pass through
//! each other.

use crate::core::vec2::Vec2;
use crate::game::track::TrackMap;
use crate::game::vehicle::{OrientedBox, Vehicle};

/// Check if a box lands on a wall cell.
///
/// Corners outside the raster count as walls.
#[inline]
pub fn box_hits_wall(track: &TrackMap, box_: &OrientedBox) -> bool {
    box_.corners.iter().any(|corner| track.is_blocked(*corner))
}

/// Whether moving `vehicle` by `vector` would put any corner on a wall.
pub fn would_collide(track: &TrackMap, vehicle: &Vehicle, vector: Vec2) -> bool {
    box_hits_wall(track, &vehicle.corners().translated(vector))
}

/// Move `vehicle` by `vector` if legal.
///
/// An illegal move is never applied: the vehicle keeps its position and
/// heading and is stopped dead. Returns whether the move was committed.
pub fn resolve_move(track: &TrackMap, vehicle: &mut Vehicle, vector: Vec2) -> bool {
    if would_collide(track, vehicle, vector) {
        vehicle.stop();
        return false;
    }
    vehicle.apply_move(vector);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PointConfig, StartLineConfig, StartPointConfig};
    use crate::game::vehicle::VehicleId;
    use image::{Rgb, RgbImage};
    use std::f64::consts::FRAC_PI_2;

    /// 100x100 open field with a wall block at [40,50) x [40,50).
    fn block_track() -> TrackMap {
        let image = RgbImage::from_fn(100, 100, |x, y| {
            if (40..50).contains(&x) && (40..50).contains(&y) {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let line = StartLineConfig {
            p1: PointConfig { x: 80.0, y: 10.0 },
            p2: PointConfig { x: 80.0, y: 30.0 },
        };
        let start = StartPointConfig { x: 70.0, y: 20.0, heading_degrees: 0.0 };
        TrackMap::build(&image, Some(line), Some(start)).unwrap()
    }

    fn vehicle_at(x: f64, y: f64) -> Vehicle {
        Vehicle::new(VehicleId(1), 4.0, 4.0, Vec2::new(x, y), FRAC_PI_2, false)
    }

    #[test]
    fn test_free_move_is_legal() {
        let track = block_track();
        let vehicle = vehicle_at(20.0, 45.0);
        assert!(!would_collide(&track, &vehicle, Vec2::new(5.0, 0.0)));
    }

    #[test]
    fn test_move_into_block_collides() {
        let track = block_track();
        let vehicle = vehicle_at(35.0, 45.0);
        // Front corners would land at x = 42
        assert!(would_collide(&track, &vehicle, Vec2::new(5.0, 0.0)));
    }

    #[test]
    fn test_single_corner_clipping_collides() {
        let track = block_track();
        // Only the front-right corner reaches the block's top-left cell
        let vehicle = vehicle_at(37.0, 37.0);
        assert!(would_collide(&track, &vehicle, Vec2::new(2.0, 2.0)));
    }

    #[test]
    fn test_leaving_the_raster_collides() {
        let track = block_track();
        let vehicle = vehicle_at(97.0, 10.0);
        assert!(would_collide(&track, &vehicle, Vec2::new(5.0, 0.0)));
    }

    #[test]
    fn test_resolve_rejects_and_stops() {
        let track = block_track();
        let mut vehicle = vehicle_at(35.0, 45.0);
        vehicle.speed = 5.0;
        vehicle.yaw_rate = 1.5;
        let before = vehicle.position;
        let heading = vehicle.heading;

        let vector = vehicle.movement_vector();
        assert!(!resolve_move(&track, &mut vehicle, vector));
        assert_eq!(vehicle.position, before);
        assert_eq!(vehicle.heading, heading);
        assert_eq!(vehicle.speed, 0.0);
        assert_eq!(vehicle.yaw_rate, 0.0);
    }

    #[test]
    fn test_resolve_commits_legal_move() {
        let track = block_track();
        let mut vehicle = vehicle_at(20.0, 45.0);
        vehicle.speed = 5.0;
        let vector = vehicle.movement_vector();
        assert!(resolve_move(&track, &mut vehicle, vector));
        assert!(vehicle.position.approx_eq(Vec2::new(25.0, 45.0), 1e-9));
        assert_eq!(vehicle.speed, 5.0);
    }
}
