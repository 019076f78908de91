//! Simulation Context
//!
//! Owns everything one tick touches: the shared track, the vehicle set,
//! the fastest lap and the simulation clock. Nothing here is global; the
//! context is passed explicitly to every tick.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::game::events::SimEvent;
use crate::game::input::ControlAction;
use crate::game::lap::FastestLap;
use crate::game::sensor::SensorArray;
use crate::game::track::TrackMap;
use crate::game::vehicle::{ControlProfile, Vehicle, VehicleId};

/// Simulation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SimError {
    /// No live vehicle with this id.
    #[error("unknown vehicle {0}")]
    UnknownVehicle(VehicleId),
}

/// The simulation context.
#[derive(Debug)]
pub struct Simulation {
    /// Track shared read-only by every vehicle
    pub(crate) track: Arc<TrackMap>,

    /// Live vehicles (BTreeMap for stable iteration order)
    pub(crate) vehicles: BTreeMap<VehicleId, Vehicle>,

    /// Ray caster
    pub(crate) sensors: SensorArray,

    /// Best lap across all vehicles
    pub(crate) fastest_lap: FastestLap,

    /// Ticks run so far
    pub(crate) tick: u64,

    /// Simulation clock (ms), advanced by each tick's `dt`
    pub(crate) clock_ms: u64,

    /// Events not yet collected
    pub(crate) events: Vec<SimEvent>,

    next_id: u32,
    vehicle_width: f64,
    vehicle_height: f64,
    human_profile: ControlProfile,
    agent_profile: ControlProfile,
}

impl Simulation {
    /// Create an empty simulation on `track`.
    pub fn new(track: Arc<TrackMap>, config: &SimConfig) -> Self {
        Self {
            track,
            vehicles: BTreeMap::new(),
            sensors: SensorArray::new(config.sensor_range),
            fastest_lap: FastestLap::new(config.fastest_lap_ms),
            tick: 0,
            clock_ms: 0,
            events: Vec::new(),
            next_id: 1,
            vehicle_width: config.vehicle_width,
            vehicle_height: config.vehicle_height,
            human_profile: config.human,
            agent_profile: config.agent,
        }
    }

    /// The shared track.
    #[inline]
    pub fn track(&self) -> &Arc<TrackMap> {
        &self.track
    }

    /// Ticks run so far.
    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Simulation clock (ms).
    #[inline]
    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    /// Best lap so far.
    #[inline]
    pub fn fastest_lap_ms(&self) -> Option<u64> {
        self.fastest_lap.get()
    }

    /// Forget the best lap.
    pub fn reset_fastest_lap(&mut self) {
        self.fastest_lap.reset();
        info!("Fastest lap reset");
    }

    /// Get vehicle by id.
    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(&id)
    }

    /// Get mutable vehicle by id.
    pub fn vehicle_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(&id)
    }

    /// Live vehicles in id order.
    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    /// Number of live vehicles.
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// Spawn a vehicle at the start pose with fresh sensor readings.
    pub fn add_vehicle(&mut self, human_controlled: bool) -> VehicleId {
        let id = VehicleId(self.next_id);
        self.next_id += 1;

        let mut vehicle = Vehicle::new(
            id,
            self.vehicle_width,
            self.vehicle_height,
            self.track.start_point(),
            self.track.initial_heading(),
            human_controlled,
        );
        vehicle.sensors = self.sensors.cast_all(&self.track, &vehicle);
        self.vehicles.insert(id, vehicle);

        debug!("Added vehicle {} (human: {})", id, human_controlled);
        id
    }

    /// Take a vehicle off the track.
    pub fn remove_vehicle(&mut self, id: VehicleId) -> Result<Vehicle, SimError> {
        let vehicle = self.vehicles.remove(&id).ok_or(SimError::UnknownVehicle(id))?;
        debug!("Removed vehicle {}", id);
        Ok(vehicle)
    }

    /// Stop a vehicle and put it back on the start pose with lap state cleared.
    pub fn restart_vehicle(&mut self, id: VehicleId) -> Result<(), SimError> {
        let track = &self.track;
        let vehicle = self.vehicles.get_mut(&id).ok_or(SimError::UnknownVehicle(id))?;
        vehicle.reset_to(track.start_point(), track.initial_heading());
        vehicle.sensors = self.sensors.cast_all(track, vehicle);
        debug!("Restarted vehicle {}", id);
        Ok(())
    }

    /// Remove every vehicle.
    pub fn clear_vehicles(&mut self) {
        self.vehicles.clear();
    }

    /// Remove every agent-driven vehicle; returns how many were removed.
    pub fn remove_agent_vehicles(&mut self) -> usize {
        let before = self.vehicles.len();
        self.vehicles.retain(|_, v| v.human_controlled);
        before - self.vehicles.len()
    }

    /// Apply one action to the vehicle's current state.
    ///
    /// Unknown ids and collided vehicles ignore the action. Returns whether
    /// it was applied.
    pub fn apply_action(&mut self, id: VehicleId, action: &ControlAction) -> bool {
        let Some(vehicle) = self.vehicles.get_mut(&id) else {
            return false;
        };
        if vehicle.collided {
            return false;
        }
        let profile = if vehicle.human_controlled {
            &self.human_profile
        } else {
            &self.agent_profile
        };
        action.apply(vehicle, profile);
        true
    }

    /// Apply a batch of actions; returns how many were applied.
    pub fn apply_actions<'a>(
        &mut self,
        actions: impl IntoIterator<Item = (VehicleId, &'a ControlAction)>,
    ) -> usize {
        actions
            .into_iter()
            .filter(|(id, action)| self.apply_action(*id, action))
            .count()
    }

    /// Elapsed time of the vehicle's running lap.
    pub fn current_lap_ms(&self, id: VehicleId) -> Option<u64> {
        let start = self.vehicles.get(&id)?.lap.lap_start_ms()?;
        Some(self.clock_ms.saturating_sub(start))
    }

    /// Add an event to the pending list.
    pub(crate) fn push_event(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Drain pending events.
    pub fn take_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PointConfig, StartLineConfig, StartPointConfig};
    use crate::core::vec2::Vec2;
    use crate::game::input::Command;
    use image::{Rgb, RgbImage};
    use std::f64::consts::FRAC_PI_2;

    fn open_track() -> Arc<TrackMap> {
        let image = RgbImage::from_fn(200, 100, |x, y| {
            if x == 0 || y == 0 || x == 199 || y == 99 {
                Rgb([0, 0, 0])
            } else {
                Rgb([90, 90, 90])
            }
        });
        let line = StartLineConfig {
            p1: PointConfig { x: 100.0, y: 10.0 },
            p2: PointConfig { x: 100.0, y: 90.0 },
        };
        let start = StartPointConfig { x: 60.0, y: 50.0, heading_degrees: 0.0 };
        Arc::new(TrackMap::build(&image, Some(line), Some(start)).unwrap())
    }

    fn simulation() -> Simulation {
        Simulation::new(open_track(), &SimConfig::default())
    }

    #[test]
    fn test_add_vehicle_at_start_pose() {
        let mut sim = simulation();
        let id = sim.add_vehicle(false);
        let vehicle = sim.vehicle(id).unwrap();

        assert_eq!(vehicle.position, Vec2::new(60.0, 50.0));
        assert!((vehicle.heading - FRAC_PI_2).abs() < 1e-9);
        assert_eq!(vehicle.speed, 0.0);
        // Sensors are live from the start
        assert!(vehicle.sensors[2].distance > 0.0);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut sim = simulation();
        let a = sim.add_vehicle(false);
        sim.remove_vehicle(a).unwrap();
        let b = sim.add_vehicle(false);
        assert_ne!(a, b);
    }

    #[test]
    fn test_remove_unknown_vehicle() {
        let mut sim = simulation();
        assert_eq!(
            sim.remove_vehicle(VehicleId(42)).unwrap_err(),
            SimError::UnknownVehicle(VehicleId(42))
        );
        assert!(sim.restart_vehicle(VehicleId(42)).is_err());
    }

    #[test]
    fn test_remove_agent_vehicles_keeps_humans() {
        let mut sim = simulation();
        let human = sim.add_vehicle(true);
        sim.add_vehicle(false);
        sim.add_vehicle(false);

        assert_eq!(sim.remove_agent_vehicles(), 2);
        assert_eq!(sim.vehicle_count(), 1);
        assert!(sim.vehicle(human).is_some());

        sim.clear_vehicles();
        assert_eq!(sim.vehicle_count(), 0);
    }

    #[test]
    fn test_actions_use_profile_by_controller() {
        let mut sim = simulation();
        let human = sim.add_vehicle(true);
        let agent = sim.add_vehicle(false);
        let accelerate = ControlAction::Command(Command::Accelerate);

        assert!(sim.apply_action(human, &accelerate));
        assert!(sim.apply_action(agent, &accelerate));
        assert_eq!(sim.vehicle(human).unwrap().speed, ControlProfile::HUMAN.accelerate);
        assert_eq!(sim.vehicle(agent).unwrap().speed, ControlProfile::AGENT.accelerate);
    }

    #[test]
    fn test_unknown_and_collided_vehicles_ignore_actions() {
        let mut sim = simulation();
        let id = sim.add_vehicle(false);
        let accelerate = ControlAction::Command(Command::Accelerate);

        let batch = [(VehicleId(999), &accelerate), (id, &accelerate)];
        assert_eq!(sim.apply_actions(batch), 1);

        sim.vehicles.get_mut(&id).unwrap().collided = true;
        assert!(!sim.apply_action(id, &accelerate));
        assert_eq!(sim.vehicle(id).unwrap().speed, ControlProfile::AGENT.accelerate);
    }

    #[test]
    fn test_restart_clears_state() {
        let mut sim = simulation();
        let id = sim.add_vehicle(true);
        {
            let v = sim.vehicles.get_mut(&id).unwrap();
            v.position = Vec2::new(150.0, 20.0);
            v.speed = 3.0;
            v.collided = true;
        }
        sim.restart_vehicle(id).unwrap();

        let v = sim.vehicle(id).unwrap();
        assert_eq!(v.position, Vec2::new(60.0, 50.0));
        assert_eq!(v.speed, 0.0);
        assert!(!v.collided);
        assert_eq!(v.lap.lap_start_ms(), None);
    }

    #[test]
    fn test_fastest_lap_seeded_and_reset() {
        let config = SimConfig {
            fastest_lap_ms: Some(45_000),
            ..SimConfig::default()
        };
        let mut sim = Simulation::new(open_track(), &config);
        assert_eq!(sim.fastest_lap_ms(), Some(45_000));
        sim.reset_fastest_lap();
        assert_eq!(sim.fastest_lap_ms(), None);
    }
}
