//! Raster Racing Simulator
//!
//! Runs the simulation on a frame clock. With an agent URL configured it
//! trains against the learning agent; without one it runs a headless demo
//! drive and logs the lap results.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use raster_racing::{
    tick, SimConfig, Simulation, TrackConfig, TrackMap, VERSION,
    game::{
        clock::{fixed_step_ms, FrameClock},
        events::SimEventData,
        input::{Command, ControlAction},
        snapshot::Snapshot,
        vehicle::VehicleId,
    },
    network::{AgentLink, AgentLinkError, TrainingSession},
};

/// Keepalive cadence towards the agent.
const PING_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("Raster Racing v{}", VERSION);

    let config = match std::env::var("RACING_SIM_CONFIG") {
        Ok(path) => SimConfig::load(&path).with_context(|| format!("loading {}", path))?,
        Err(_) => SimConfig::default(),
    };
    let track_path = std::env::var("RACING_TRACK_CONFIG")
        .context("RACING_TRACK_CONFIG must point at a track config")?;
    let track_config = TrackConfig::load(&track_path)
        .with_context(|| format!("loading {}", track_path))?;
    let track = Arc::new(TrackMap::from_config(&track_config)?);

    info!("Tick Rate: {} Hz", config.tick_rate);

    let sim = Simulation::new(track, &config);
    match config.agent_url.clone() {
        Some(url) => run_training(sim, &config, &url).await,
        None => {
            demo_drive(sim, &config);
            Ok(())
        }
    }
}

/// Frame interval for `tick_rate`.
fn frame_duration(config: &SimConfig) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(config.tick_rate.max(1)))
}

/// Train against the agent until it disconnects or Ctrl-C.
async fn run_training(mut sim: Simulation, config: &SimConfig, url: &str) -> anyhow::Result<()> {
    let mut link = AgentLink::connect(url).await?;
    let mut session = TrainingSession::new(config.population);
    link.send(session.handshake())?;

    let mut frames = interval(frame_duration(config));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut publish = interval(Duration::from_millis(config.agent_interval_ms.max(1)));
    publish.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut keepalive = interval(PING_INTERVAL);
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut snapshot = Snapshot::capture(&sim);
    let mut clock = FrameClock::new();
    let mut last_frame = Instant::now();

    loop {
        tokio::select! {
            _ = frames.tick() => {
                let now = Instant::now();
                let dt_ms = clock.advance(now.duration_since(last_frame));
                last_frame = now;

                let result = tick(&mut sim, dt_ms);
                log_events(&result.events);
                snapshot = result.snapshot;
            }
            _ = publish.tick() => {
                if let Some(message) = session.game_state(&snapshot) {
                    if !forward(&link, message) {
                        break;
                    }
                }
            }
            _ = keepalive.tick() => {
                if !forward(&link, session.ping()) {
                    break;
                }
            }
            inbound = link.recv() => match inbound {
                Some(message) => session.handle(&mut sim, message),
                None => {
                    warn!("Agent disconnected");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    info!(
        "Session over: {} generations, {} actions applied, fastest lap {:?}",
        session.generation(),
        session.actions_applied(),
        sim.fastest_lap_ms()
    );
    Ok(())
}

/// Send to the agent; returns false once the link is gone.
fn forward(link: &AgentLink, message: raster_racing::network::AgentOutbound) -> bool {
    match link.send(message) {
        Ok(()) => true,
        Err(AgentLinkError::Backlogged) => {
            warn!("Agent link backlogged, dropping message");
            true
        }
        Err(e) => {
            error!("{}", e);
            false
        }
    }
}

fn log_events(events: &[raster_racing::game::SimEvent]) {
    for event in events {
        match event.data {
            SimEventData::LapCompleted { vehicle_id, duration_ms } => {
                info!("[tick {}] {} lap {}", event.tick, vehicle_id, format_lap(duration_ms));
            }
            SimEventData::FastestLapUpdated { duration_ms } => {
                info!("[tick {}] fastest lap {}", event.tick, format_lap(duration_ms));
            }
            _ => {}
        }
    }
}

/// `m:ss.mmm`, as the timer display shows it.
fn format_lap(duration_ms: u64) -> String {
    format!(
        "{}:{:02}.{:03}",
        duration_ms / 60_000,
        (duration_ms % 60_000) / 1000,
        duration_ms % 1000
    )
}

/// Demo: one sensor-steered vehicle driven headless.
fn demo_drive(mut sim: Simulation, config: &SimConfig) {
    info!("=== Starting Demo Drive ===");

    let id = sim.add_vehicle(false);

    info!("Running {} ticks...", config.demo_ticks);

    let mut total_events = 0;
    for frame in 0..config.demo_ticks {
        if let Some(action) = demo_action(&sim, id) {
            sim.apply_action(id, &action);
        }

        let result = tick(&mut sim, fixed_step_ms(u64::from(frame), config.tick_rate));
        total_events += result.events.len();
        log_events(&result.events);

        if sim.vehicle(id).is_some_and(|v| v.collided) {
            info!("[tick {}] vehicle hit a wall, restarting", sim.tick_count());
            if let Err(e) = sim.restart_vehicle(id) {
                error!("{}", e);
                break;
            }
        }
    }

    info!("=== Demo Drive Complete ===");
    info!("Total ticks: {}", sim.tick_count());
    info!("Total events: {}", total_events);
    if let Some(vehicle) = sim.vehicle(id) {
        info!(
            "Final pose: {} heading {:.1}° speed {:.2}",
            vehicle.position,
            vehicle.heading.to_degrees(),
            vehicle.speed
        );
    }
    match sim.fastest_lap_ms() {
        Some(best) => info!("Fastest lap: {}", format_lap(best)),
        None => info!("No lap completed"),
    }
}

/// Steer away from the nearer side wall when something is close ahead;
/// otherwise hold a cruising speed.
fn demo_action(sim: &Simulation, id: VehicleId) -> Option<ControlAction> {
    let vehicle = sim.vehicle(id)?;
    let [_, left, ahead, right, _] = vehicle.sensors.map(|s| s.distance);

    let steer = if ahead < 80.0 {
        if left > right { Some(Command::Left) } else { Some(Command::Right) }
    } else {
        None
    };
    let throttle = if vehicle.speed < 1.5 { Some(Command::Accelerate) } else { None };
    Some(ControlAction::Pair([throttle, steer]))
}
