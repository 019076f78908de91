//! # Raster Racing
//!
//! Vehicle simulation over a rasterized track, built for human drivers and
//! for a learning agent steering many vehicles at once.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      RASTER RACING                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Geometry primitives                       │
//! │  ├── vec2.rs     - 2D vector                                 │
//! │  └── geometry.rs - Segments, intersection, angles            │
//! │                                                              │
//! │  config.rs       - Track and simulation configuration        │
//! │                                                              │
//! │  game/           - Simulation (single-threaded)              │
//! │  ├── track.rs    - Occupancy raster and start geometry       │
//! │  ├── vehicle.rs  - Kinematics and oriented box               │
//! │  ├── collision.rs- Wall test for prospective moves           │
//! │  ├── sensor.rs   - Distance rays                             │
//! │  ├── lap.rs      - Start-line crossing state machine         │
//! │  ├── input.rs    - Control actions                           │
//! │  ├── state.rs    - Simulation context                        │
//! │  ├── tick.rs     - Per-frame orchestration                   │
//! │  └── snapshot.rs - Published state                           │
//! │                                                              │
//! │  network/        - Agent link (async)                        │
//! │  ├── protocol.rs - Message types                             │
//! │  ├── training.rs - Generation lifecycle                      │
//! │  └── client.rs   - WebSocket client                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//!
//! The [`game::Simulation`] owns the vehicle set and shares the
//! [`game::TrackMap`] read-only. Vehicles never reference the track and
//! the track never references vehicles; the tick mediates.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod config;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use crate::core::vec2::Vec2;
pub use crate::core::geometry::Segment;
pub use config::{ConfigError, SimConfig, TrackConfig};
pub use game::state::{Simulation, SimError};
pub use game::tick::{tick, TickResult};
pub use game::track::TrackMap;
pub use game::vehicle::{Vehicle, VehicleId};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default frame rate (Hz)
pub const TICK_RATE: u32 = 60;
