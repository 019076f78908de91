//! Game Logic Module
//!
//! Everything one frame touches. Single-threaded; nothing here suspends.
//!
//! ## Module Structure
//!
//! - `track`: Occupancy raster, start line and start pose
//! - `vehicle`: Kinematic state and oriented box
//! - `collision`: Prospective-move wall test
//! - `sensor`: Five-ray distance sensors
//! - `lap`: Start-line crossing state machine and fastest lap
//! - `input`: Control actions (keyboard or agent)
//! - `state`: Simulation context and vehicle lifecycle
//! - `tick`: Per-frame orchestration
//! - `clock`: Frame timing to tick `dt`
//! - `snapshot`: Published per-tick state
//! - `events`: Lap, timing and collision notifications

pub mod track;
pub mod vehicle;
pub mod collision;
pub mod sensor;
pub mod lap;
pub mod input;
pub mod state;
pub mod tick;
pub mod clock;
pub mod snapshot;
pub mod events;

// Re-export key types
pub use track::{TrackMap, OutOfBounds};
pub use vehicle::{Vehicle, VehicleId, OrientedBox, ControlProfile};
pub use sensor::{SensorArray, SensorReading, SENSOR_COUNT};
pub use lap::{LapState, LapRecord, CrossingOutcome, FastestLap};
pub use input::{Command, ControlAction};
pub use state::{Simulation, SimError};
pub use tick::{tick, TickResult};
pub use clock::{FrameClock, fixed_step_ms};
pub use snapshot::{Snapshot, VehicleSnapshot, AgentVehicleState};
pub use events::{SimEvent, SimEventData};
