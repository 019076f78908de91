//! Lap Crossing State Machine
//!
//! Detects start/finish line contact per vehicle, classifies the crossing
//! direction against the track's forward heading, and closes laps.
//!
//! ## States
//!
//! Line contact debounces repeated detection while the box straddles the line:
//!
//! ```text
//! Clear ──(box touches line)──▶ Crossing(Forward | Reverse) ──(box leaves)──▶ Clear
//! ```
//!
//! Lap standing carries the timer and the anti-cheat marker:
//!
//! ```text
//! Unarmed ──fwd──▶ Armed{start}           (first crossing only arms the timer)
//! Armed{s} ──fwd──▶ Armed{now} + LapRecord(now - s)
//! Armed{s} / Unarmed ──rev──▶ Voided{s?}  (timer untouched)
//! Voided{s?} ──fwd──▶ Armed{s} / Unarmed  (cancels the reverse pass, no lap)
//! ```

use serde::{Serialize, Deserialize};

use crate::core::geometry::angle_between;
use crate::game::track::TrackMap;
use crate::game::vehicle::{OrientedBox, Vehicle, VehicleId};

/// Largest heading deviation from track-forward that still counts as forward.
pub const FORWARD_TOLERANCE: f64 = std::f64::consts::FRAC_PI_2;

/// Direction of a line crossing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// With the track
    Forward,
    /// Against the track
    Reverse,
}

/// Whether the box currently touches the start line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineContact {
    /// Not touching
    #[default]
    Clear,
    /// Touching since a rising edge classified with this direction
    Crossing(Direction),
}

/// Timer and anti-cheat state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LapStanding {
    /// No lap running yet
    #[default]
    Unarmed,
    /// Lap running since `lap_start_ms`
    Armed {
        /// Simulation time the lap started
        lap_start_ms: u64,
    },
    /// Crossed backward; the next forward crossing only cancels this
    Voided {
        /// Lap that was running before the reverse pass, if any
        lap_start_ms: Option<u64>,
    },
}

/// A completed lap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LapRecord {
    /// Vehicle that completed it
    pub vehicle_id: VehicleId,
    /// Lap duration
    pub duration_ms: u64,
}

/// What a rising or falling edge did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrossingOutcome {
    /// No edge this tick
    Unchanged,
    /// Box left the line
    Released,
    /// First forward crossing started the timer
    LapArmed,
    /// Forward crossing closed a lap
    LapCompleted(LapRecord),
    /// Backward crossing voided lap credit
    ReverseCrossing,
    /// Forward crossing cancelled an earlier backward one
    ReverseCancelled,
}

/// Per-vehicle lap state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LapState {
    /// Line contact (debounce)
    pub contact: LineContact,
    /// Timer / anti-cheat
    pub standing: LapStanding,
}

impl LapState {
    /// Whether the box is on the line.
    #[inline]
    pub fn crossing_line(&self) -> bool {
        matches!(self.contact, LineContact::Crossing(_))
    }

    /// Whether a backward crossing is pending cancellation.
    #[inline]
    pub fn reverse_move(&self) -> bool {
        matches!(self.standing, LapStanding::Voided { .. })
    }

    /// Start of the running lap.
    pub fn lap_start_ms(&self) -> Option<u64> {
        match self.standing {
            LapStanding::Unarmed => None,
            LapStanding::Armed { lap_start_ms } => Some(lap_start_ms),
            LapStanding::Voided { lap_start_ms } => lap_start_ms,
        }
    }

    /// Feed one tick's contact observation.
    ///
    /// `direction` is only consulted on a rising edge.
    pub fn observe(
        &mut self,
        vehicle_id: VehicleId,
        touching: bool,
        direction: impl FnOnce() -> Direction,
        now_ms: u64,
    ) -> CrossingOutcome {
        match (self.contact, touching) {
            (LineContact::Clear, false) | (LineContact::Crossing(_), true) => CrossingOutcome::Unchanged,
            (LineContact::Crossing(_), false) => {
                self.contact = LineContact::Clear;
                CrossingOutcome::Released
            }
            (LineContact::Clear, true) => {
                let direction = direction();
                self.contact = LineContact::Crossing(direction);
                self.on_rising_edge(vehicle_id, direction, now_ms)
            }
        }
    }

    fn on_rising_edge(&mut self, vehicle_id: VehicleId, direction: Direction, now_ms: u64) -> CrossingOutcome {
        match (direction, self.standing) {
            (Direction::Reverse, standing) => {
                self.standing = LapStanding::Voided {
                    lap_start_ms: match standing {
                        LapStanding::Unarmed => None,
                        LapStanding::Armed { lap_start_ms } => Some(lap_start_ms),
                        LapStanding::Voided { lap_start_ms } => lap_start_ms,
                    },
                };
                CrossingOutcome::ReverseCrossing
            }
            (Direction::Forward, LapStanding::Voided { lap_start_ms }) => {
                self.standing = match lap_start_ms {
                    Some(lap_start_ms) => LapStanding::Armed { lap_start_ms },
                    None => LapStanding::Unarmed,
                };
                CrossingOutcome::ReverseCancelled
            }
            (Direction::Forward, LapStanding::Unarmed) => {
                self.standing = LapStanding::Armed { lap_start_ms: now_ms };
                CrossingOutcome::LapArmed
            }
            (Direction::Forward, LapStanding::Armed { lap_start_ms }) => {
                self.standing = LapStanding::Armed { lap_start_ms: now_ms };
                CrossingOutcome::LapCompleted(LapRecord {
                    vehicle_id,
                    duration_ms: now_ms.saturating_sub(lap_start_ms),
                })
            }
        }
    }
}

/// Whether the box touches the start line after moving from `previous`.
///
/// Any perimeter edge of `current` on the line counts, and so does any
/// corner whose path from `previous` crosses it. The swept paths catch a
/// box that clears the whole line within a single tick.
pub fn touches_start_line(track: &TrackMap, previous: &OrientedBox, current: &OrientedBox) -> bool {
    let on_line = current
        .edges()
        .iter()
        .any(|edge| track.segment_intersects_start_line(edge.p1, edge.p2));
    on_line
        || previous
            .corners
            .iter()
            .zip(current.corners.iter())
            .any(|(from, to)| track.segment_intersects_start_line(*from, *to))
}

/// Classify by travel heading against `initial_heading()`.
///
/// Within +-90 degrees is forward. The travel heading is flipped while
/// reversing, so backing over the line the right way still counts.
pub fn classify_direction(track: &TrackMap, vehicle: &Vehicle) -> Direction {
    classify_heading(vehicle.travel_heading(), track.initial_heading())
}

fn classify_heading(travel_heading: f64, forward_heading: f64) -> Direction {
    if angle_between(travel_heading, forward_heading) <= FORWARD_TOLERANCE {
        Direction::Forward
    } else {
        Direction::Reverse
    }
}

/// Run the state machine for `vehicle` after a committed move.
///
/// `previous` is the box before the move.
pub fn update_lap(
    track: &TrackMap,
    vehicle: &mut Vehicle,
    previous: &OrientedBox,
    now_ms: u64,
) -> CrossingOutcome {
    let touching = touches_start_line(track, previous, &vehicle.corners());
    let direction = classify_direction(track, vehicle);
    let id = vehicle.id;
    vehicle.lap.observe(id, touching, || direction, now_ms)
}

/// Process-wide fastest lap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FastestLap(Option<u64>);

impl FastestLap {
    /// Seed from a persisted value.
    pub const fn new(duration_ms: Option<u64>) -> Self {
        Self(duration_ms)
    }

    /// Current best.
    #[inline]
    pub fn get(&self) -> Option<u64> {
        self.0
    }

    /// Offer a lap; returns true when it becomes the new best.
    ///
    /// Replaces only on strictly smaller durations.
    pub fn offer(&mut self, duration_ms: u64) -> bool {
        match self.0 {
            Some(best) if duration_ms >= best => false,
            _ => {
                self.0 = Some(duration_ms);
                true
            }
        }
    }

    /// Forget the best lap.
    pub fn reset(&mut self) {
        self.0 = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PointConfig, StartLineConfig, StartPointConfig};
    use crate::core::vec2::Vec2;
    use image::{Rgb, RgbImage};
    use std::f64::consts::{FRAC_PI_2, PI};

    const ID: VehicleId = VehicleId(7);

    /// Open 200x100 field, vertical start line at x = 100, forward is east.
    fn line_track() -> TrackMap {
        let image = RgbImage::from_pixel(200, 100, Rgb([255, 255, 255]));
        let line = StartLineConfig {
            p1: PointConfig { x: 100.0, y: 10.0 },
            p2: PointConfig { x: 100.0, y: 90.0 },
        };
        let start = StartPointConfig { x: 50.0, y: 50.0, heading_degrees: 0.0 };
        TrackMap::build(&image, Some(line), Some(start)).unwrap()
    }

    fn vehicle_at(x: f64, heading: f64, speed: f64) -> Vehicle {
        let mut vehicle = Vehicle::new(ID, 10.0, 20.0, Vec2::new(x, 50.0), heading, false);
        vehicle.speed = speed;
        vehicle
    }

    fn cross(state: &mut LapState, direction: Direction, now_ms: u64) -> CrossingOutcome {
        let outcome = state.observe(ID, true, || direction, now_ms);
        assert_eq!(state.observe(ID, false, || direction, now_ms + 1), CrossingOutcome::Released);
        outcome
    }

    #[test]
    fn test_first_crossing_only_arms() {
        let mut state = LapState::default();
        assert_eq!(cross(&mut state, Direction::Forward, 1_000), CrossingOutcome::LapArmed);
        assert_eq!(state.lap_start_ms(), Some(1_000));
        assert!(!state.reverse_move());
    }

    #[test]
    fn test_second_forward_crossing_closes_lap() {
        let mut state = LapState::default();
        cross(&mut state, Direction::Forward, 1_000);
        let outcome = cross(&mut state, Direction::Forward, 31_500);
        assert_eq!(
            outcome,
            CrossingOutcome::LapCompleted(LapRecord { vehicle_id: ID, duration_ms: 30_500 })
        );
        assert_eq!(state.lap_start_ms(), Some(31_500));
    }

    #[test]
    fn test_contact_is_debounced() {
        let mut state = LapState::default();
        assert_eq!(state.observe(ID, true, || Direction::Forward, 0), CrossingOutcome::LapArmed);
        assert!(state.crossing_line());
        for t in 1..10 {
            let outcome = state.observe(ID, true, || panic!("direction re-evaluated"), t);
            assert_eq!(outcome, CrossingOutcome::Unchanged);
        }
        assert_eq!(state.lap_start_ms(), Some(0));
    }

    #[test]
    fn test_reverse_then_forward_cancels() {
        let mut state = LapState::default();
        cross(&mut state, Direction::Forward, 0);

        assert_eq!(cross(&mut state, Direction::Reverse, 5_000), CrossingOutcome::ReverseCrossing);
        assert!(state.reverse_move());
        assert_eq!(state.lap_start_ms(), Some(0));

        assert_eq!(cross(&mut state, Direction::Forward, 6_000), CrossingOutcome::ReverseCancelled);
        assert!(!state.reverse_move());
        // Timer neither closed nor restarted
        assert_eq!(state.lap_start_ms(), Some(0));

        // A genuine lap afterwards measures from the first start
        assert_eq!(
            cross(&mut state, Direction::Forward, 40_000),
            CrossingOutcome::LapCompleted(LapRecord { vehicle_id: ID, duration_ms: 40_000 })
        );
    }

    #[test]
    fn test_reverse_before_any_lap() {
        let mut state = LapState::default();
        assert_eq!(cross(&mut state, Direction::Reverse, 100), CrossingOutcome::ReverseCrossing);
        assert_eq!(state.lap_start_ms(), None);
        assert_eq!(cross(&mut state, Direction::Forward, 200), CrossingOutcome::ReverseCancelled);
        assert_eq!(state.standing, LapStanding::Unarmed);
        assert_eq!(cross(&mut state, Direction::Forward, 300), CrossingOutcome::LapArmed);
    }

    #[test]
    fn test_repeated_reverse_stays_voided() {
        let mut state = LapState::default();
        cross(&mut state, Direction::Forward, 10);
        cross(&mut state, Direction::Reverse, 20);
        cross(&mut state, Direction::Reverse, 30);
        assert_eq!(state.standing, LapStanding::Voided { lap_start_ms: Some(10) });
    }

    #[test]
    fn test_classify_direction_by_travel() {
        let track = line_track();
        assert_eq!(classify_direction(&track, &vehicle_at(90.0, FRAC_PI_2, 3.0)), Direction::Forward);
        assert_eq!(classify_direction(&track, &vehicle_at(110.0, 3.0 * FRAC_PI_2, 3.0)), Direction::Reverse);
        // Facing west while reversing travels east
        assert_eq!(classify_direction(&track, &vehicle_at(90.0, 3.0 * FRAC_PI_2, -3.0)), Direction::Forward);
        // Exactly perpendicular still counts as forward
        assert_eq!(classify_direction(&track, &vehicle_at(90.0, PI, 3.0)), Direction::Forward);
    }

    #[test]
    fn test_box_on_line_touches() {
        let track = line_track();
        let vehicle = vehicle_at(95.0, FRAC_PI_2, 0.0);
        let corners = vehicle.corners();
        assert!(touches_start_line(&track, &corners, &corners));

        let away = vehicle_at(60.0, FRAC_PI_2, 0.0).corners();
        assert!(!touches_start_line(&track, &away, &away));
    }

    #[test]
    fn test_line_jumped_in_one_tick_is_counted() {
        let track = line_track();
        // 20 long, moving 40 px: the box is clear of the line before and after
        let mut vehicle = vehicle_at(80.0, FRAC_PI_2, 40.0);
        let previous = vehicle.corners();
        vehicle.apply_move(vehicle.movement_vector());
        assert!((vehicle.position.x - 120.0).abs() < 1e-9);
        assert!(!vehicle
            .corners()
            .edges()
            .iter()
            .any(|edge| track.segment_intersects_start_line(edge.p1, edge.p2)));

        assert_eq!(update_lap(&track, &mut vehicle, &previous, 500), CrossingOutcome::LapArmed);
        assert_eq!(vehicle.lap.lap_start_ms(), Some(500));

        // Next tick is past the line: contact released, no second crossing
        let previous = vehicle.corners();
        vehicle.apply_move(vehicle.movement_vector());
        assert_eq!(update_lap(&track, &mut vehicle, &previous, 600), CrossingOutcome::Released);
    }

    #[test]
    fn test_fastest_lap_strictly_smaller() {
        let mut best = FastestLap::default();
        assert!(best.offer(30_000));
        assert!(!best.offer(30_000));
        assert!(!best.offer(31_000));
        assert!(best.offer(29_999));
        assert_eq!(best.get(), Some(29_999));

        best.reset();
        assert_eq!(best.get(), None);
        assert!(best.offer(50_000));
    }

    #[test]
    fn test_fastest_lap_seeded() {
        let mut best = FastestLap::new(Some(20_000));
        assert!(!best.offer(25_000));
        assert!(best.offer(19_000));
    }
}
