//! Training Session
//!
//! Drives the agent side of the simulation: spawns a generation of agent
//! vehicles when asked, publishes their state while a generation is live,
//! and applies incoming action batches to whatever the vehicles are doing
//! right now. Stale actions are not queued; they land on current state.

use tracing::{debug, info, warn};

use crate::game::snapshot::Snapshot;
use crate::game::state::Simulation;
use crate::network::protocol::{AgentInbound, AgentOutbound};

/// Where the session is in a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingPhase {
    /// No generation on track.
    Idle,
    /// Generation spawned; agent is reading initial state.
    Spawned,
    /// Generation driving.
    Running,
}

/// Agent session bookkeeping.
#[derive(Debug)]
pub struct TrainingSession {
    phase: TrainingPhase,
    population: usize,
    generation: u32,
    actions_applied: u64,
    awaiting_pong: bool,
}

impl TrainingSession {
    /// Create an idle session for a model of `population` genomes.
    pub fn new(population: usize) -> Self {
        Self {
            phase: TrainingPhase::Idle,
            population,
            generation: 0,
            actions_applied: 0,
            awaiting_pong: false,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> TrainingPhase {
        self.phase
    }

    /// Generations spawned so far.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Actions applied over the session's lifetime.
    pub fn actions_applied(&self) -> u64 {
        self.actions_applied
    }

    /// First message after connecting.
    pub fn handshake(&self) -> AgentOutbound {
        AgentOutbound::ModelInit(self.population)
    }

    /// Keepalive. Warns when the previous ping went unanswered.
    pub fn ping(&mut self) -> AgentOutbound {
        if self.awaiting_pong {
            warn!("Agent did not answer the last ping");
        }
        self.awaiting_pong = true;
        AgentOutbound::Ping
    }

    /// Apply one inbound message to `sim`.
    pub fn handle(&mut self, sim: &mut Simulation, message: AgentInbound) {
        match message {
            AgentInbound::NewGeneration(count) => {
                let removed = sim.remove_agent_vehicles();
                for _ in 0..count {
                    sim.add_vehicle(false);
                }
                self.generation += 1;
                self.phase = TrainingPhase::Spawned;
                info!(
                    "Generation {}: spawned {} agent vehicles (removed {})",
                    self.generation, count, removed
                );
            }
            AgentInbound::Start => {
                self.phase = TrainingPhase::Running;
                info!("Generation {} running", self.generation);
            }
            AgentInbound::Stop => {
                let removed = sim.remove_agent_vehicles();
                self.phase = TrainingPhase::Idle;
                info!("Generation {} stopped ({} vehicles removed)", self.generation, removed);
            }
            AgentInbound::CarAction(batch) => {
                let applied = sim.apply_actions(
                    batch
                        .iter()
                        .filter_map(|(id, action)| action.as_ref().map(|action| (*id, action))),
                );
                self.actions_applied += applied as u64;
                debug!("Applied {}/{} agent actions", applied, batch.len());
            }
            AgentInbound::Pong => {
                self.awaiting_pong = false;
            }
            AgentInbound::ModelInit(status) => {
                info!("Agent model init: {}", status);
            }
            AgentInbound::Message(text) => {
                debug!("Agent says: {}", text);
            }
        }
    }

    /// State publication for this agent interval, if a generation is live.
    pub fn game_state(&self, snapshot: &Snapshot) -> Option<AgentOutbound> {
        match self.phase {
            TrainingPhase::Idle => None,
            TrainingPhase::Spawned | TrainingPhase::Running => {
                Some(AgentOutbound::GameState(snapshot.agent_view()))
            }
        }
    }
}
