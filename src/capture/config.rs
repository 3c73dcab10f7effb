//! Capture and tracker configuration.
//!
//! Settings come from three layers, lowest precedence first: built-in
//! defaults, a TOML file, then the `TRACK_FPS`, `CAMERA_INDEX` and
//! `FACE_LANDMARKER_MODEL` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Highest accepted target frame rate.
pub const MAX_FPS: u32 = 120;

/// Configuration for camera capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera device index.
    pub device_id: u32,
    /// Requested frame width in pixels.
    pub width: u32,
    /// Requested frame height in pixels.
    pub height: u32,
    /// Target frames per second. Also paces the worker loop.
    pub fps: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            width: 640,
            height: 480,
            fps: 10,
        }
    }
}

impl CaptureConfig {
    /// Creates a new configuration with the specified dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.fps == 0 || self.fps > MAX_FPS {
            return Err(ConfigError::InvalidFrameRate);
        }
        Ok(())
    }

    /// Minimum time between two worker ticks.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}

/// Settings for the background tracking worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Camera settings.
    pub capture: CaptureConfig,
    /// Landmark model asset. Checked during the capability probe when set.
    pub model_path: Option<PathBuf>,
    /// Delay before retrying after a failed frame read.
    pub frame_retry_ms: u64,
    /// Publication period while the worker is degraded.
    pub degraded_interval_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            model_path: None,
            frame_retry_ms: 100,
            degraded_interval_ms: 1000,
        }
    }
}

impl TrackerConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        if self.degraded_interval_ms == 0 {
            return Err(ConfigError::InvalidDegradedInterval);
        }
        Ok(())
    }

    /// Delay before retrying a failed frame read.
    pub fn frame_retry(&self) -> Duration {
        Duration::from_millis(self.frame_retry_ms)
    }

    /// Period between error snapshots in the degraded phase.
    pub fn degraded_interval(&self) -> Duration {
        Duration::from_millis(self.degraded_interval_ms)
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    #[error("invalid frame rate (must be 1-120 fps)")]
    InvalidFrameRate,
    #[error("degraded publication interval must be non-zero")]
    InvalidDegradedInterval,
    #[error("invalid value {value:?} for environment variable {name}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output configuration for the CLI consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Rate at which the CLI pulls snapshots from the feed.
    pub stream_fps: u32,
    /// Number of snapshots to print before exiting (0 = until Ctrl-C).
    pub snapshot_count: u64,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            stream_fps: 10,
            snapshot_count: 0,
            metrics_port: 9090,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: FileConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.tracker.validate()?;
        Ok(config)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Applies overrides using the given variable lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("TRACK_FPS") {
            let fps = parse_env("TRACK_FPS", &value)?;
            self.tracker.capture.fps = fps;
            self.output.stream_fps = fps;
        }
        if let Some(value) = lookup("CAMERA_INDEX") {
            self.tracker.capture.device_id = parse_env("CAMERA_INDEX", &value)?;
        }
        if let Some(value) = lookup("FACE_LANDMARKER_MODEL") {
            if !value.trim().is_empty() {
                self.tracker.model_path = Some(PathBuf::from(value.trim()));
            }
        }
        self.tracker.validate()
    }
}

fn parse_env(name: &'static str, value: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv {
            name,
            value: value.to_string(),
        })
}
