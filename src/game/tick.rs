//! Simulation Tick
//!
//! One frame for every live vehicle: move or reject, update lap state,
//! refresh sensors, then publish a snapshot.
//!
//! Vehicles are processed independently. There is no vehicle-vs-vehicle
//! contact, so iteration order never changes the outcome.

use tracing::{debug, info};

use crate::game::collision::resolve_move;
use crate::game::events::SimEvent;
use crate::game::lap::{update_lap, CrossingOutcome, FastestLap};
use crate::game::sensor::SensorArray;
use crate::game::snapshot::Snapshot;
use crate::game::state::Simulation;
use crate::game::track::TrackMap;
use crate::game::vehicle::Vehicle;

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick
    pub events: Vec<SimEvent>,
    /// State after the tick
    pub snapshot: Snapshot,
}

/// Run one simulation tick.
///
/// # Arguments
///
/// * `sim` - The simulation context (will be mutated)
/// * `dt_ms` - Time since the previous tick; advances the lap clock
///
/// Actions are not an argument: whatever was applied to the vehicles
/// since the last tick is what they drive with.
pub fn tick(sim: &mut Simulation, dt_ms: u64) -> TickResult {
    // 0. Advance counters
    sim.tick += 1;
    sim.clock_ms = sim.clock_ms.saturating_add(dt_ms);

    let tick = sim.tick;
    let now_ms = sim.clock_ms;
    let mut events = Vec::new();

    for vehicle in sim.vehicles.values_mut() {
        step_vehicle(
            &sim.track,
            &sim.sensors,
            &mut sim.fastest_lap,
            vehicle,
            tick,
            now_ms,
            &mut events,
        );
    }

    for event in events {
        sim.push_event(event);
    }

    TickResult {
        events: sim.take_events(),
        snapshot: Snapshot::capture(sim),
    }
}

/// Advance a single vehicle by one tick.
fn step_vehicle(
    track: &TrackMap,
    sensors: &SensorArray,
    fastest_lap: &mut FastestLap,
    vehicle: &mut Vehicle,
    tick: u64,
    now_ms: u64,
    events: &mut Vec<SimEvent>,
) {
    // 1. Propose the move
    let vector = vehicle.movement_vector();
    let previous = vehicle.corners();

    // 2. Reject or commit
    if !resolve_move(track, vehicle, vector) {
        if !vehicle.collided {
            debug!("Vehicle {} hit a wall at {}", vehicle.id, vehicle.position);
            events.push(SimEvent::vehicle_collided(tick, vehicle.id));
        }
        vehicle.collided = true;
    } else {
        if !vector.is_zero() {
            vehicle.collided = false;
        }

        // 3. Lap crossing
        match update_lap(track, vehicle, &previous, now_ms) {
            CrossingOutcome::LapArmed => {
                debug!("Vehicle {} started a lap", vehicle.id);
                events.push(SimEvent::lap_started(tick, vehicle.id));
            }
            CrossingOutcome::LapCompleted(record) => {
                info!("Vehicle {} completed a lap in {}ms", record.vehicle_id, record.duration_ms);
                events.push(SimEvent::lap_completed(tick, record.vehicle_id, record.duration_ms));
                if fastest_lap.offer(record.duration_ms) {
                    info!("New fastest lap: {}ms", record.duration_ms);
                    events.push(SimEvent::fastest_lap_updated(tick, record.duration_ms));
                }
            }
            CrossingOutcome::ReverseCrossing => {
                debug!("Vehicle {} crossed the line in reverse", vehicle.id);
                events.push(SimEvent::reverse_crossing(tick, vehicle.id));
            }
            CrossingOutcome::Unchanged
            | CrossingOutcome::Released
            | CrossingOutcome::ReverseCancelled => {}
        }
    }

    // 4. Refresh sensors
    vehicle.sensors = sensors.cast_all(track, vehicle);

    #[cfg(feature = "debug-tracing")]
    tracing::trace!(
        "tick {} vehicle {}: pos={} heading={:.4} speed={:.3} collided={}",
        tick,
        vehicle.id,
        vehicle.position,
        vehicle.heading,
        vehicle.speed,
        vehicle.collided,
    );
}
