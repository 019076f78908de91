//! Network Layer
//!
//! Link to the external learning agent. Runs on its own cadence; the
//! simulation only ever sees whole decoded messages.

pub mod protocol;
pub mod training;
pub mod client;

pub use protocol::{AgentInbound, AgentOutbound, ProtocolError};
pub use training::{TrainingSession, TrainingPhase};
pub use client::{AgentLink, AgentLinkError};
