//! Control Actions
//!
//! Driving commands as they arrive from a keyboard or the learning agent,
//! and how each one changes a vehicle.

use serde::{Serialize, Deserialize};

use crate::game::vehicle::{ControlProfile, Vehicle};

/// Discrete driving command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Steer left at full lock
    Left,
    /// Steer right at full lock
    Right,
    /// Add speed
    Accelerate,
    /// Remove speed, then reverse
    Brake,
}

/// One control action for one vehicle.
///
/// Wire forms (JSON):
/// - `"accelerate"`: a single command
/// - `[0.8, -0.25]`: continuous `[throttleBrake, steer]`, each in `[-1, 1]`
/// - `["brake", null]`: `[throttle command, steer command]`; a null steer
///   releases the wheel
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlAction {
    /// Single command
    Command(Command),
    /// Proportional throttle/brake and steering
    Continuous([f64; 2]),
    /// Optional throttle command plus optional steering command
    Pair([Option<Command>; 2]),
}

impl ControlAction {
    /// Apply to `vehicle` using `profile` rates.
    pub fn apply(&self, vehicle: &mut Vehicle, profile: &ControlProfile) {
        match *self {
            ControlAction::Command(command) => apply_command(vehicle, profile, command),
            ControlAction::Continuous([throttle_brake, steer]) => {
                let throttle_brake = unit(throttle_brake);
                if throttle_brake > 0.0 {
                    vehicle.increase_speed(throttle_brake * profile.accelerate);
                } else if throttle_brake < 0.0 {
                    vehicle.decrease_speed(-throttle_brake * profile.brake);
                }
                vehicle.set_yaw_rate(unit(steer) * profile.steer_degrees);
            }
            ControlAction::Pair([throttle, steer]) => {
                if let Some(command) = throttle {
                    apply_command(vehicle, profile, command);
                }
                match steer {
                    Some(command) => apply_command(vehicle, profile, command),
                    None => vehicle.set_yaw_rate(0.0),
                }
            }
        }
    }
}

impl From<Command> for ControlAction {
    fn from(command: Command) -> Self {
        ControlAction::Command(command)
    }
}

fn apply_command(vehicle: &mut Vehicle, profile: &ControlProfile, command: Command) {
    match command {
        Command::Left => vehicle.set_yaw_rate(-profile.steer_degrees),
        Command::Right => vehicle.set_yaw_rate(profile.steer_degrees),
        Command::Accelerate => vehicle.increase_speed(profile.accelerate),
        Command::Brake => vehicle.decrease_speed(profile.brake),
    }
}

/// Clamp to `[-1, 1]`; non-finite input counts as 0.
fn unit(value: f64) -> f64 {
    if value.is_finite() { value.clamp(-1.0, 1.0) } else { 0.0 }
}
