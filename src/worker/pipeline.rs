//! Capability probing and tracker resource ownership.

use crate::capture::{Camera, CameraError, CaptureConfig, MockCamera, TrackerConfig};
use crate::landmarks::{DetectorError, FaceProfile, LandmarkDetector, SyntheticFaceDetector};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Smallest model file accepted as a real asset.
pub const MIN_MODEL_BYTES: u64 = 1024;

/// Factory for the external collaborators of one worker instance.
///
/// Called on the worker thread, once per worker start. Both methods hand
/// back ready-to-use resources; the worker closes them on teardown.
pub trait TrackerBackend: Send + Sync {
    /// Creates and opens the frame source.
    fn open_camera(&self, config: &CaptureConfig) -> Result<Box<dyn Camera>, CameraError>;

    /// Creates the landmark detector.
    fn open_detector(
        &self,
        config: &TrackerConfig,
    ) -> Result<Box<dyn LandmarkDetector>, DetectorError>;
}

/// Why the tracker cannot run in this worker instance.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// The configured model file cannot be read.
    #[error("landmark model not found at {path}: {reason}")]
    ModelMissing { path: PathBuf, reason: String },
    /// The model file exists but is too small to be a real asset.
    #[error("landmark model at {path} is truncated ({size} bytes)")]
    ModelTooSmall { path: PathBuf, size: u64 },
    /// The camera failed to open.
    #[error("camera not available: {0}")]
    Camera(#[from] CameraError),
    /// The detector could not be created.
    #[error(transparent)]
    Detector(#[from] DetectorError),
}

/// Outcome of the one-time capability check.
pub enum Capability {
    /// Camera and detector are open and ready.
    Available(Pipeline),
    /// Tracking cannot run in this worker instance.
    Unavailable(CapabilityError),
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Available(_) => f.write_str("Available"),
            Capability::Unavailable(e) => f.debug_tuple("Unavailable").field(e).finish(),
        }
    }
}

/// Open camera and detector, released together when dropped.
///
/// Teardown lives in `Drop` so it also runs when the steady-state loop
/// unwinds.
pub struct Pipeline {
    camera: Box<dyn Camera>,
    detector: Box<dyn LandmarkDetector>,
}

impl Pipeline {
    /// The open frame source.
    pub fn camera(&mut self) -> &mut dyn Camera {
        self.camera.as_mut()
    }

    /// The landmark detector.
    pub fn detector(&mut self) -> &mut dyn LandmarkDetector {
        self.detector.as_mut()
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.detector.close();
        self.camera.close();
        tracing::info!("Tracker resources released");
    }
}

/// Probes the model asset, camera and detector, in that order.
pub fn probe(backend: &dyn TrackerBackend, config: &TrackerConfig) -> Capability {
    match open_pipeline(backend, config) {
        Ok(pipeline) => Capability::Available(pipeline),
        Err(e) => Capability::Unavailable(e),
    }
}

fn open_pipeline(
    backend: &dyn TrackerBackend,
    config: &TrackerConfig,
) -> Result<Pipeline, CapabilityError> {
    if let Some(path) = &config.model_path {
        check_model_asset(path)?;
    }

    let mut camera = backend.open_camera(&config.capture)?;
    let detector = match backend.open_detector(config) {
        Ok(detector) => detector,
        Err(e) => {
            camera.close();
            return Err(e.into());
        }
    };

    Ok(Pipeline { camera, detector })
}

fn check_model_asset(path: &Path) -> Result<(), CapabilityError> {
    let metadata = std::fs::metadata(path).map_err(|e| CapabilityError::ModelMissing {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if metadata.len() <= MIN_MODEL_BYTES {
        return Err(CapabilityError::ModelTooSmall {
            path: path.to_path_buf(),
            size: metadata.len(),
        });
    }
    Ok(())
}

/// Model-free backend: mock (or native) frames plus a synthetic face.
#[derive(Debug, Clone, Default)]
pub struct SyntheticBackend {
    profile: FaceProfile,
    seed: u64,
    native_camera: bool,
}

impl SyntheticBackend {
    /// Backend animating `profile` with the given seed over mock frames.
    pub fn new(profile: FaceProfile, seed: u64) -> Self {
        Self {
            profile,
            seed,
            native_camera: false,
        }
    }

    /// Pulls frames from the real camera (requires the `camera` feature).
    pub fn with_native_camera(mut self) -> Self {
        self.native_camera = true;
        self
    }
}

impl TrackerBackend for SyntheticBackend {
    fn open_camera(&self, config: &CaptureConfig) -> Result<Box<dyn Camera>, CameraError> {
        let mut camera: Box<dyn Camera> = if self.native_camera {
            native_camera()?
        } else {
            Box::new(MockCamera::new())
        };
        camera.open(config)?;
        Ok(camera)
    }

    fn open_detector(
        &self,
        _config: &TrackerConfig,
    ) -> Result<Box<dyn LandmarkDetector>, DetectorError> {
        Ok(Box::new(SyntheticFaceDetector::new(
            self.profile.clone(),
            self.seed,
        )))
    }
}

#[cfg(feature = "camera")]
fn native_camera() -> Result<Box<dyn Camera>, CameraError> {
    Ok(Box::new(crate::capture::NativeCamera::new()))
}

#[cfg(not(feature = "camera"))]
fn native_camera() -> Result<Box<dyn Camera>, CameraError> {
    Err(CameraError::DeviceNotFound(
        "built without the `camera` feature".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::ScriptedDetector;
    use std::io::Write;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingBackend {
        camera_missing: bool,
        detector_fails: bool,
        detector_closed: Mutex<Option<Arc<AtomicBool>>>,
    }

    impl TrackerBackend for RecordingBackend {
        fn open_camera(&self, config: &CaptureConfig) -> Result<Box<dyn Camera>, CameraError> {
            let mut camera = if self.camera_missing {
                MockCamera::unavailable("unplugged")
            } else {
                MockCamera::new()
            };
            camera.open(config)?;
            Ok(Box::new(camera))
        }

        fn open_detector(
            &self,
            _config: &TrackerConfig,
        ) -> Result<Box<dyn LandmarkDetector>, DetectorError> {
            if self.detector_fails {
                return Err(DetectorError::InitFailed("bad graph".into()));
            }
            let detector = ScriptedDetector::empty();
            *self.detector_closed.lock().unwrap() = Some(detector.closed_flag());
            Ok(Box::new(detector))
        }
    }

    #[test]
    fn test_available_pipeline_released_on_drop() {
        let backend = RecordingBackend::default();
        let capability = probe(&backend, &TrackerConfig::default());

        let pipeline = match capability {
            Capability::Available(pipeline) => pipeline,
            other => panic!("expected available pipeline, got {:?}", other),
        };
        let closed = backend.detector_closed.lock().unwrap().clone().unwrap();
        assert!(!closed.load(Ordering::Acquire));

        drop(pipeline);
        assert!(closed.load(Ordering::Acquire));
    }

    #[test]
    fn test_missing_camera_unavailable() {
        let backend = RecordingBackend {
            camera_missing: true,
            ..Default::default()
        };
        match probe(&backend, &TrackerConfig::default()) {
            Capability::Unavailable(CapabilityError::Camera(e)) => {
                assert!(e.to_string().contains("CAMERA_INDEX=0"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_detector_failure_unavailable() {
        let backend = RecordingBackend {
            detector_fails: true,
            ..Default::default()
        };
        assert!(matches!(
            probe(&backend, &TrackerConfig::default()),
            Capability::Unavailable(CapabilityError::Detector(DetectorError::InitFailed(_)))
        ));
    }

    #[test]
    fn test_model_asset_checks() {
        let backend = RecordingBackend::default();
        let mut config = TrackerConfig::default();

        config.model_path = Some(PathBuf::from("/nonexistent/face_landmarker.task"));
        assert!(matches!(
            probe(&backend, &config),
            Capability::Unavailable(CapabilityError::ModelMissing { .. })
        ));

        let mut small = tempfile::NamedTempFile::new().unwrap();
        small.write_all(&[0u8; 100]).unwrap();
        config.model_path = Some(small.path().to_path_buf());
        assert!(matches!(
            probe(&backend, &config),
            Capability::Unavailable(CapabilityError::ModelTooSmall { size: 100, .. })
        ));

        let mut model = tempfile::NamedTempFile::new().unwrap();
        model.write_all(&[0u8; 4096]).unwrap();
        config.model_path = Some(model.path().to_path_buf());
        assert!(matches!(probe(&backend, &config), Capability::Available(_)));
    }

    #[cfg(not(feature = "camera"))]
    #[test]
    fn test_native_camera_needs_feature() {
        let backend = SyntheticBackend::default().with_native_camera();
        assert!(matches!(
            backend.open_camera(&CaptureConfig::default()),
            Err(CameraError::DeviceNotFound(_))
        ));
    }
}
