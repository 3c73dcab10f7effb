//! Face landmark types and detectors.
//!
//! The landmark model is an external collaborator. This module defines
//! the named points the signal extractor reads, the detector trait the
//! worker drives, and two model-free detectors (scripted and synthetic).

mod detector;
mod points;
mod synthetic;

pub use detector::{DetectorError, LandmarkDetector, ScriptedDetector, ScriptedResult};
pub use points::{FaceLandmarks, LandmarkId, Point2};
pub use synthetic::{FaceGeometry, FaceProfile, SyntheticFaceDetector};
