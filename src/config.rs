//! Configuration
//!
//! Track configuration records (one per track) and simulation settings.
//! Both are JSON; the track record keeps the camelCase field names of
//! the track files, simulation settings use snake_case.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::geometry::Segment;
use crate::core::vec2::Vec2;
use crate::game::vehicle::ControlProfile;

/// Configuration errors. Fatal to the track load that raised them.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config or image file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// JSON could not be parsed.
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// Track image could not be decoded.
    #[error("failed to decode track image: {0}")]
    Image(#[from] image::ImageError),

    /// Track image has a zero dimension.
    #[error("track image is empty ({width}x{height})")]
    EmptyImage {
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },

    /// Start line or start point missing from the track record.
    #[error("track configuration is missing its {0}")]
    MissingStartGeometry(&'static str),
}

/// A point as written in track files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointConfig {
    /// X (pixels)
    pub x: f64,
    /// Y (pixels)
    pub y: f64,
}

impl From<PointConfig> for Vec2 {
    fn from(p: PointConfig) -> Self {
        Vec2::new(p.x, p.y)
    }
}

/// Start/finish line endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartLineConfig {
    /// First endpoint
    pub p1: PointConfig,
    /// Second endpoint
    pub p2: PointConfig,
}

impl StartLineConfig {
    /// As a geometric segment.
    pub fn segment(&self) -> Segment {
        Segment::new(self.p1.into(), self.p2.into())
    }
}

/// Spawn pose for vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPointConfig {
    /// X (pixels)
    pub x: f64,
    /// Y (pixels)
    pub y: f64,
    /// Fallback heading in degrees, used when the start line gives no direction
    #[serde(default, alias = "rotation")]
    pub heading_degrees: f64,
}

/// One track: raster image plus start geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackConfig {
    /// Path of the track image (relative paths resolve against the config file)
    pub image_url: String,
    /// Spawn pose
    #[serde(default)]
    pub start_point: Option<StartPointConfig>,
    /// Start/finish line
    #[serde(default)]
    pub start_line: Option<StartLineConfig>,
}

impl TrackConfig {
    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a file. `image_url` is rewritten relative to the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = read(path)?;
        let mut config = Self::from_json(&json)?;

        let image = Path::new(&config.image_url);
        if image.is_relative() {
            if let Some(dir) = path.parent() {
                config.image_url = dir.join(image).to_string_lossy().into_owned();
            }
        }
        Ok(config)
    }

    /// Start line, or `MissingStartGeometry`.
    pub fn require_start_line(&self) -> Result<StartLineConfig, ConfigError> {
        self.start_line.ok_or(ConfigError::MissingStartGeometry("start line"))
    }

    /// Start point, or `MissingStartGeometry`.
    pub fn require_start_point(&self) -> Result<StartPointConfig, ConfigError> {
        self.start_point.ok_or(ConfigError::MissingStartGeometry("start point"))
    }

    /// Decode the track image as RGB.
    pub fn load_image(&self) -> Result<image::RgbImage, ConfigError> {
        let img = image::open(&self.image_url).map_err(|e| match e {
            image::ImageError::IoError(source) => ConfigError::Io {
                path: PathBuf::from(&self.image_url),
                source,
            },
            other => ConfigError::Image(other),
        })?;
        Ok(img.to_rgb8())
    }
}

/// Simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Frame clock rate (Hz)
    pub tick_rate: u32,
    /// Vehicle body width (pixels, across the heading)
    pub vehicle_width: f64,
    /// Vehicle body length (pixels, along the heading)
    pub vehicle_height: f64,
    /// Maximum sensor ray length; None = bounded only by the track diagonal
    pub sensor_range: Option<f64>,
    /// Control rates for keyboard-driven vehicles
    pub human: ControlProfile,
    /// Control rates for agent-driven vehicles
    pub agent: ControlProfile,
    /// WebSocket URL of the learning agent; None runs the headless demo
    pub agent_url: Option<String>,
    /// Cadence of state publication to the agent (ms)
    pub agent_interval_ms: u64,
    /// Population requested from the agent on connect
    pub population: usize,
    /// Frames to run in headless demo mode
    pub demo_ticks: u32,
    /// Previously persisted fastest lap (ms)
    pub fastest_lap_ms: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: crate::TICK_RATE,
            vehicle_width: 15.0,
            vehicle_height: 25.0,
            sensor_range: None,
            human: ControlProfile::HUMAN,
            agent: ControlProfile::AGENT,
            agent_url: None,
            agent_interval_ms: 17,
            population: 20,
            demo_ticks: 600,
            fastest_lap_ms: None,
        }
    }
}

impl SimConfig {
    /// Parse from a JSON string; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&read(path.as_ref())?)
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK_JSON: &str = r#"{
        "imageUrl": "track001.png",
        "startPoint": { "x": 120, "y": 300, "rotation": 90 },
        "startLine": { "p1": { "x": 150, "y": 260 }, "p2": { "x": 150, "y": 340 } }
    }"#;

    #[test]
    fn test_parse_track_config() {
        let config = TrackConfig::from_json(TRACK_JSON).unwrap();
        assert_eq!(config.image_url, "track001.png");

        let start = config.require_start_point().unwrap();
        assert_eq!(start.x, 120.0);
        assert_eq!(start.heading_degrees, 90.0);

        let line = config.require_start_line().unwrap().segment();
        assert_eq!(line.p1, Vec2::new(150.0, 260.0));
        assert_eq!(line.p2, Vec2::new(150.0, 340.0));
    }

    #[test]
    fn test_missing_start_geometry() {
        let config = TrackConfig::from_json(r#"{ "imageUrl": "t.png" }"#).unwrap();
        assert!(matches!(
            config.require_start_line(),
            Err(ConfigError::MissingStartGeometry("start line"))
        ));
        assert!(matches!(
            config.require_start_point(),
            Err(ConfigError::MissingStartGeometry("start point"))
        ));
    }

    #[test]
    fn test_malformed_track_config() {
        let result = TrackConfig::from_json(r#"{ "startLine": 3 }"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = TrackConfig::load("/definitely/not/here.json");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_sim_config_defaults() {
        let config = SimConfig::from_json(r#"{ "vehicle_width": 10.0 }"#).unwrap();
        assert_eq!(config.vehicle_width, 10.0);
        assert_eq!(config.vehicle_height, 25.0);
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.human, ControlProfile::HUMAN);
        assert!(config.agent_url.is_none());
    }
}
