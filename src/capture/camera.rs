//! Camera abstraction for frame capture.
//!
//! This module provides a trait-based abstraction over camera hardware,
//! allowing for both real camera input and mock implementations for testing.

use super::{CaptureConfig, Frame};
use thiserror::Error;

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    #[error("failed to configure camera: {0}")]
    ConfigFailed(String),
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    #[error("camera not initialized")]
    NotInitialized,
}

impl CameraError {
    /// Returns true if retrying the capture on the next tick may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, CameraError::CaptureFailed(_))
    }
}

/// Trait for camera implementations.
///
/// This abstraction allows swapping between real camera hardware
/// and mock implementations for testing. Cameras are created, used and
/// closed on the tracking worker thread, so no `Send` bound is required.
pub trait Camera {
    /// Opens and initializes the camera with the given configuration.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError>;

    /// Captures a single frame.
    fn capture(&mut self) -> Result<Frame, CameraError>;

    /// Checks if the camera is currently open.
    fn is_open(&self) -> bool;

    /// Closes the camera and releases resources.
    fn close(&mut self);
}

/// Mock camera for testing that generates synthetic frames.
#[derive(Debug, Default)]
pub struct MockCamera {
    config: Option<CaptureConfig>,
    sequence: u64,
    /// Reason reported by `open`, simulating a missing device.
    unavailable: Option<String>,
    /// Number of upcoming captures that fail transiently.
    pending_failures: u32,
}

impl MockCamera {
    /// Creates a closed camera.
    pub fn new() -> Self {
        Self::default()
    }

    /// A camera whose `open` always fails with the given reason.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Makes the next `count` captures fail with a transient error.
    pub fn fail_next(&mut self, count: u32) {
        self.pending_failures = count;
    }
}

impl Camera for MockCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        if let Some(reason) = &self.unavailable {
            return Err(CameraError::DeviceNotFound(format!(
                "{} (CAMERA_INDEX={})",
                reason, config.device_id
            )));
        }
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        self.config = Some(config.clone());
        self.sequence = 0;
        tracing::info!(device = config.device_id, "MockCamera opened");
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        let config = self.config.as_ref().ok_or(CameraError::NotInitialized)?;

        if self.pending_failures > 0 {
            self.pending_failures -= 1;
            return Err(CameraError::CaptureFailed("simulated read failure".into()));
        }

        // Flat mid-grey image; detectors used with the mock ignore pixels
        let pixel_bytes = (config.width * config.height * 3) as usize;
        self.sequence += 1;
        Ok(Frame::new(
            vec![128u8; pixel_bytes],
            config.width,
            config.height,
            self.sequence,
        ))
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        if self.config.take().is_some() {
            tracing::info!("MockCamera closed");
        }
    }
}

/// Native camera backed by `nokhwa`.
#[cfg(feature = "camera")]
pub struct NativeCamera {
    inner: Option<nokhwa::Camera>,
    sequence: u64,
}

#[cfg(feature = "camera")]
impl NativeCamera {
    /// Creates a closed native camera.
    pub fn new() -> Self {
        Self {
            inner: None,
            sequence: 0,
        }
    }
}

#[cfg(feature = "camera")]
impl Default for NativeCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "camera")]
impl Camera for NativeCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        use nokhwa::pixel_format::RgbFormat;
        use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};

        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;

        let index = CameraIndex::Index(config.device_id);
        let format =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = nokhwa::Camera::new(index, format).map_err(|e| {
            CameraError::DeviceNotFound(format!("{} (CAMERA_INDEX={})", e, config.device_id))
        })?;
        camera
            .open_stream()
            .map_err(|e| CameraError::OpenFailed(e.to_string()))?;

        tracing::info!(device = config.device_id, "Native camera opened");
        self.inner = Some(camera);
        self.sequence = 0;
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        use nokhwa::pixel_format::RgbFormat;

        let camera = self.inner.as_mut().ok_or(CameraError::NotInitialized)?;
        let buffer = camera
            .frame()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
        let image = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;

        self.sequence += 1;
        let (width, height) = (image.width(), image.height());
        Ok(Frame::new(image.into_raw(), width, height, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    fn close(&mut self) {
        if let Some(mut camera) = self.inner.take() {
            if let Err(e) = camera.stop_stream() {
                tracing::warn!(error = %e, "Failed to stop camera stream");
            }
            tracing::info!("Native camera closed");
        }
    }
}
