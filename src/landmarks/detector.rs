//! Landmark detector abstraction.
//!
//! The face-landmark model itself lives outside this crate; the tracker
//! only needs "given a frame, return zero or one face, or fail".

use super::FaceLandmarks;
use crate::capture::Frame;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while creating or running a detector.
#[derive(Debug, Clone, Error)]
pub enum DetectorError {
    /// The model could not be loaded or configured.
    #[error("failed to initialize landmark detector: {0}")]
    InitFailed(String),
    /// One detection call failed; the next frame may succeed.
    #[error("landmark detection failed: {0}")]
    DetectionFailed(String),
    /// The detector was used after `close`.
    #[error("landmark detector closed")]
    Closed,
}

/// Trait for single-face landmark detectors.
///
/// Like cameras, detectors are created and used on the worker thread.
pub trait LandmarkDetector {
    /// Detects at most one face in the frame.
    ///
    /// `timestamp_ms` is monotonic within one worker instance; video-mode
    /// models use it to track faces across frames.
    fn detect(
        &mut self,
        frame: &Frame,
        timestamp_ms: u64,
    ) -> Result<Option<FaceLandmarks>, DetectorError>;

    /// Releases model resources.
    fn close(&mut self);
}

/// One scripted detector response.
pub type ScriptedResult = Result<Option<FaceLandmarks>, DetectorError>;

/// Detector that replays a fixed script of results, cycling forever.
///
/// Used by tests to drive the worker loop through known observations.
#[derive(Debug)]
pub struct ScriptedDetector {
    script: VecDeque<ScriptedResult>,
    closed: Arc<AtomicBool>,
    calls: u64,
}

impl ScriptedDetector {
    /// Creates a detector replaying `script` in order, then from the start.
    pub fn new(script: impl IntoIterator<Item = ScriptedResult>) -> Self {
        Self {
            script: script.into_iter().collect(),
            closed: Arc::new(AtomicBool::new(false)),
            calls: 0,
        }
    }

    /// A detector that always sees the same face.
    pub fn constant(face: FaceLandmarks) -> Self {
        Self::new([Ok(Some(face))])
    }

    /// A detector that never finds a face.
    pub fn empty() -> Self {
        Self::new([Ok(None)])
    }

    /// Flag set once `close` has been called.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }

    /// Number of `detect` calls so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl LandmarkDetector for ScriptedDetector {
    fn detect(&mut self, _frame: &Frame, _timestamp_ms: u64) -> ScriptedResult {
        if self.closed.load(Ordering::Acquire) {
            return Err(DetectorError::Closed);
        }
        self.calls += 1;
        match self.script.pop_front() {
            Some(result) => {
                self.script.push_back(result.clone());
                result
            }
            None => Ok(None),
        }
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::Release);
    }
}
