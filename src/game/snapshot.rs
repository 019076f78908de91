//! Per-Tick Snapshot
//!
//! Immutable copy of the simulation state handed to the renderer and,
//! through the agent view, to the learning agent.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::game::sensor::{SensorReading, SENSOR_COUNT};
use crate::game::state::Simulation;
use crate::game::vehicle::{Vehicle, VehicleId};

/// One sensor ray as published.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSnapshot {
    /// Distance to the obstacle
    pub distance: f64,
    /// Ray end X
    pub end_x: f64,
    /// Ray end Y
    pub end_y: f64,
}

impl From<&SensorReading> for SensorSnapshot {
    fn from(reading: &SensorReading) -> Self {
        Self {
            distance: reading.distance,
            end_x: reading.end_point.x,
            end_y: reading.end_point.y,
        }
    }
}

/// Published state of one vehicle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSnapshot {
    /// Vehicle id
    pub id: VehicleId,
    /// Signed speed
    pub speed: f64,
    /// Sensor rays, left to right
    pub sensors: [SensorSnapshot; SENSOR_COUNT],
    /// Stopped by a wall
    pub collided: bool,
    /// Center X
    pub x: f64,
    /// Center Y
    pub y: f64,
    /// Heading (radians)
    pub heading: f64,
    /// Oriented box corners: front-left, front-right, rear-left, rear-right
    pub corners: [[f64; 2]; 4],
    /// Keyboard-driven
    pub human_controlled: bool,
    /// Elapsed time of the running lap
    pub lap_elapsed_ms: Option<u64>,
}

impl VehicleSnapshot {
    fn capture(vehicle: &Vehicle, clock_ms: u64) -> Self {
        Self {
            id: vehicle.id,
            speed: vehicle.speed,
            sensors: vehicle.sensors.map(|reading| SensorSnapshot::from(&reading)),
            collided: vehicle.collided,
            x: vehicle.position.x,
            y: vehicle.position.y,
            heading: vehicle.heading,
            corners: vehicle.corners().corners.map(|c| [c.x, c.y]),
            human_controlled: vehicle.human_controlled,
            lap_elapsed_ms: vehicle
                .lap
                .lap_start_ms()
                .map(|start| clock_ms.saturating_sub(start)),
        }
    }
}

/// Whole-simulation snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Tick that produced it
    pub tick: u64,
    /// Simulation clock (ms)
    pub clock_ms: u64,
    /// Best lap so far
    pub fastest_lap_ms: Option<u64>,
    /// Vehicles in id order
    pub vehicles: Vec<VehicleSnapshot>,
}

impl Snapshot {
    /// Capture the current state.
    pub fn capture(sim: &Simulation) -> Self {
        let clock_ms = sim.clock_ms();
        Self {
            tick: sim.tick_count(),
            clock_ms,
            fastest_lap_ms: sim.fastest_lap_ms(),
            vehicles: sim
                .vehicles()
                .map(|v| VehicleSnapshot::capture(v, clock_ms))
                .collect(),
        }
    }

    /// Agent-facing view: agent-driven vehicles only, keyed by id.
    pub fn agent_view(&self) -> BTreeMap<VehicleId, AgentVehicleState> {
        self.vehicles
            .iter()
            .filter(|v| !v.human_controlled)
            .map(|v| {
                (
                    v.id,
                    AgentVehicleState {
                        speed: v.speed,
                        sensors: v.sensors,
                        collision: v.collided,
                    },
                )
            })
            .collect()
    }
}

/// What the agent sees of one vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentVehicleState {
    /// Signed speed
    pub speed: f64,
    /// Sensor rays, left to right
    pub sensors: [SensorSnapshot; SENSOR_COUNT],
    /// Stopped by a wall
    pub collision: bool,
}
