//! Camera input and frame handling.
//!
//! This module provides abstractions for capturing frames from a camera
//! and managing tracker configuration. Frames are only a carrier for the
//! landmark detector; no signal is computed from raw pixels here.

mod camera;
mod config;
mod frame;

#[cfg(feature = "camera")]
pub use camera::NativeCamera;
pub use camera::{Camera, CameraError, MockCamera};
pub use config::{CaptureConfig, ConfigError, FileConfig, OutputConfig, TrackerConfig, MAX_FPS};
pub use frame::Frame;
