//! Simulation Events
//!
//! Lap, timing and collision notifications produced by the tick, consumed
//! by the renderer's timer display and by the agent transport.

use serde::{Serialize, Deserialize};

use crate::game::vehicle::VehicleId;

/// Event payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SimEventData {
    /// First forward crossing armed a vehicle's lap timer
    #[serde(rename_all = "camelCase")]
    LapStarted {
        vehicle_id: VehicleId,
    },

    /// Forward crossing closed a lap
    #[serde(rename_all = "camelCase")]
    LapCompleted {
        vehicle_id: VehicleId,
        duration_ms: u64,
    },

    /// A completed lap beat the process-wide best
    #[serde(rename_all = "camelCase")]
    FastestLapUpdated {
        duration_ms: u64,
    },

    /// Vehicle crossed the line against the track direction
    #[serde(rename_all = "camelCase")]
    ReverseCrossing {
        vehicle_id: VehicleId,
    },

    /// Prospective move hit a wall; vehicle stopped
    #[serde(rename_all = "camelCase")]
    VehicleCollided {
        vehicle_id: VehicleId,
    },
}

/// An event stamped with the tick that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimEvent {
    /// Tick when the event occurred
    pub tick: u64,

    /// Event data
    pub data: SimEventData,
}

impl SimEvent {
    /// Create a new event.
    pub fn new(tick: u64, data: SimEventData) -> Self {
        Self { tick, data }
    }

    /// Create lap started event.
    pub fn lap_started(tick: u64, vehicle_id: VehicleId) -> Self {
        Self::new(tick, SimEventData::LapStarted { vehicle_id })
    }

    /// Create lap completed event.
    pub fn lap_completed(tick: u64, vehicle_id: VehicleId, duration_ms: u64) -> Self {
        Self::new(tick, SimEventData::LapCompleted { vehicle_id, duration_ms })
    }

    /// Create fastest lap event.
    pub fn fastest_lap_updated(tick: u64, duration_ms: u64) -> Self {
        Self::new(tick, SimEventData::FastestLapUpdated { duration_ms })
    }

    /// Create reverse crossing event.
    pub fn reverse_crossing(tick: u64, vehicle_id: VehicleId) -> Self {
        Self::new(tick, SimEventData::ReverseCrossing { vehicle_id })
    }

    /// Create collision event.
    pub fn vehicle_collided(tick: u64, vehicle_id: VehicleId) -> Self {
        Self::new(tick, SimEventData::VehicleCollided { vehicle_id })
    }

    /// Vehicle involved, if any.
    pub fn vehicle_id(&self) -> Option<VehicleId> {
        match self.data {
            SimEventData::LapStarted { vehicle_id }
            | SimEventData::LapCompleted { vehicle_id, .. }
            | SimEventData::ReverseCrossing { vehicle_id }
            | SimEventData::VehicleCollided { vehicle_id } => Some(vehicle_id),
            SimEventData::FastestLapUpdated { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_names() {
        let event = SimEvent::lap_completed(12, VehicleId(3), 41_250);
        let json = serde_json::to_value(event.data).unwrap();
        assert_eq!(json["type"], "lapCompleted");
        assert_eq!(json["vehicleId"], 3);
        assert_eq!(json["durationMs"], 41_250);

        let json = serde_json::to_value(SimEvent::fastest_lap_updated(12, 41_250).data).unwrap();
        assert_eq!(json["type"], "fastestLapUpdated");
    }

    #[test]
    fn test_event_vehicle_id() {
        assert_eq!(SimEvent::vehicle_collided(1, VehicleId(9)).vehicle_id(), Some(VehicleId(9)));
        assert_eq!(SimEvent::fastest_lap_updated(1, 500).vehicle_id(), None);
    }
}
