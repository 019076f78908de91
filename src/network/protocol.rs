//! Agent Protocol Messages
//!
//! Wire format between the simulation and the learning agent. Every
//! message is a JSON object `{"event": <name>, "data": <payload>}`; the
//! payload may be absent for events that carry nothing.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use serde_json::Value;
use thiserror::Error;

use crate::game::input::ControlAction;
use crate::game::snapshot::AgentVehicleState;
use crate::game::vehicle::VehicleId;

/// Failure to decode an inbound message.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Not JSON, or a payload of the wrong shape.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Event name we do not handle.
    #[error("unknown event: {0}")]
    UnknownEvent(String),
}

// =============================================================================
// AGENT -> SIMULATION
// =============================================================================

/// Messages sent by the agent.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentInbound {
    /// Replace all agent vehicles with this many fresh ones.
    NewGeneration(usize),

    /// Begin a generation's run.
    Start,

    /// End the run; agent vehicles are taken off the track.
    Stop,

    /// Batch of actions keyed by vehicle id. `None` means no action.
    CarAction(BTreeMap<VehicleId, Option<ControlAction>>),

    /// Reply to our ping.
    Pong,

    /// Model initialization status.
    ModelInit(String),

    /// Free-form text.
    Message(String),
}

/// Envelope shared by both directions.
#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

impl AgentInbound {
    /// Decode one text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let Envelope { event, data } = serde_json::from_str(text)?;
        let message = match event.as_str() {
            "new_generation" => AgentInbound::NewGeneration(serde_json::from_value(data)?),
            "start" => AgentInbound::Start,
            "stop" => AgentInbound::Stop,
            "car_action" => AgentInbound::CarAction(serde_json::from_value(data)?),
            "pong" => AgentInbound::Pong,
            "model_init" => AgentInbound::ModelInit(text_payload(data)),
            "message" => AgentInbound::Message(text_payload(data)),
            _ => return Err(ProtocolError::UnknownEvent(event)),
        };
        Ok(message)
    }
}

fn text_payload(data: Value) -> String {
    match data {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// =============================================================================
// SIMULATION -> AGENT
// =============================================================================

/// Messages sent to the agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum AgentOutbound {
    /// Ask the agent to build a model for this population.
    ModelInit(usize),

    /// Current state of every agent-driven vehicle.
    GameState(BTreeMap<VehicleId, AgentVehicleState>),

    /// Keepalive.
    Ping,

    /// Free-form text.
    Message(String),
}

impl AgentOutbound {
    /// Encode as one text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
