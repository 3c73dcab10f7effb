//! Synthetic face generation.
//!
//! [`FaceGeometry`] lays out landmark points that reproduce chosen raw
//! signal values exactly, which makes it handy in tests. The
//! [`SyntheticFaceDetector`] animates that geometry over time (periodic
//! blinks, small jitter, occasional dropouts) so the CLI can run the full
//! pipeline without a camera or a model.

use super::{DetectorError, FaceLandmarks, LandmarkDetector, LandmarkId, Point2};
use crate::capture::Frame;
use rand_chacha::ChaCha8Rng;
use rand_core::{RngCore, SeedableRng};

/// Target raw measurements for one synthetic face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceGeometry {
    /// Eye aspect ratio.
    pub ear: f64,
    /// Raw jaw openness in [0, 1].
    pub jaw_openness: f64,
    /// Raw brow tension in [0, 1].
    pub brow_tension: f64,
}

impl Default for FaceGeometry {
    fn default() -> Self {
        Self {
            ear: 0.3,
            jaw_openness: 0.25,
            brow_tension: 0.0,
        }
    }
}

impl FaceGeometry {
    /// Lays out landmarks for a frame of the given size.
    ///
    /// The nose-to-chin distance is a fifth of the frame height.
    pub fn landmarks(&self, width: u32, height: u32) -> FaceLandmarks {
        let (w, h) = (f64::from(width), f64::from(height));
        let scale = h * 0.2;
        let cx = w / 2.0;
        let nose = (cx, h / 2.0);
        let chin = (cx, h / 2.0 + scale);

        // EAR = 4 * half_open / (2 * eye_width)
        let eye_width = 0.4 * scale;
        let (ex, ey) = (cx - 0.4 * scale, h / 2.0 - 0.4 * scale);
        let half_open = self.ear * eye_width / 2.0;

        let eye_top = (ex, ey - half_open);
        let brow_norm = 0.043 - self.brow_tension.clamp(0.0, 1.0) * 0.02;
        let brow = (ex, eye_top.1 - brow_norm * scale);

        let upper_lip = (cx, h / 2.0 + 0.5 * scale);
        let mouth_gap = self.jaw_openness.clamp(0.0, 1.0) * scale / 6.0;
        let lower_lip = (cx, upper_lip.1 + mouth_gap);

        let norm = |(x, y): (f64, f64)| Point2::new(x / w, y / h);

        FaceLandmarks::new()
            .with(LandmarkId::EyeOuter, norm((ex - eye_width / 2.0, ey)))
            .with(LandmarkId::EyeUpperOuter, norm((ex - eye_width / 4.0, ey - half_open)))
            .with(LandmarkId::EyeUpperInner, norm((ex + eye_width / 4.0, ey - half_open)))
            .with(LandmarkId::EyeInner, norm((ex + eye_width / 2.0, ey)))
            .with(LandmarkId::EyeLowerInner, norm((ex + eye_width / 4.0, ey + half_open)))
            .with(LandmarkId::EyeLowerOuter, norm((ex - eye_width / 4.0, ey + half_open)))
            .with(LandmarkId::UpperLip, norm(upper_lip))
            .with(LandmarkId::LowerLip, norm(lower_lip))
            .with(LandmarkId::NoseTip, norm(nose))
            .with(LandmarkId::Chin, norm(chin))
            .with(LandmarkId::BrowMid, norm(brow))
            .with(LandmarkId::EyeTop, norm(eye_top))
    }
}

/// Behaviour of the animated synthetic face.
#[derive(Debug, Clone)]
pub struct FaceProfile {
    pub blinks_per_minute: f64,
    pub blink_duration_ms: u64,
    pub open_ear: f64,
    pub closed_ear: f64,
    pub jaw_openness: f64,
    pub brow_tension: f64,
    /// Peak-to-peak noise added to jaw and brow.
    pub jitter: f64,
    /// Probability that a frame contains no face.
    pub dropout_probability: f64,
}

impl Default for FaceProfile {
    fn default() -> Self {
        Self {
            blinks_per_minute: 15.0,
            blink_duration_ms: 200,
            open_ear: 0.3,
            closed_ear: 0.12,
            jaw_openness: 0.25,
            brow_tension: 0.2,
            jitter: 0.05,
            dropout_probability: 0.02,
        }
    }
}

/// Detector that ignores pixels and animates a [`FaceProfile`].
pub struct SyntheticFaceDetector {
    profile: FaceProfile,
    rng: ChaCha8Rng,
    closed: bool,
}

impl SyntheticFaceDetector {
    /// Creates a detector animating `profile`, reproducible per `seed`.
    pub fn new(profile: FaceProfile, seed: u64) -> Self {
        Self {
            profile,
            rng: ChaCha8Rng::seed_from_u64(seed),
            closed: false,
        }
    }

    /// Uniform sample in [0, 1].
    fn unit(&mut self) -> f64 {
        f64::from(self.rng.next_u32()) / f64::from(u32::MAX)
    }

    fn eye_closed_at(&self, timestamp_ms: u64) -> bool {
        if self.profile.blinks_per_minute <= 0.0 {
            return false;
        }
        let period_ms = (60_000.0 / self.profile.blinks_per_minute).max(1.0) as u64;
        timestamp_ms % period_ms < self.profile.blink_duration_ms
    }
}

impl Default for SyntheticFaceDetector {
    fn default() -> Self {
        Self::new(FaceProfile::default(), 0x5eed)
    }
}

impl LandmarkDetector for SyntheticFaceDetector {
    fn detect(
        &mut self,
        frame: &Frame,
        timestamp_ms: u64,
    ) -> Result<Option<FaceLandmarks>, DetectorError> {
        if self.closed {
            return Err(DetectorError::Closed);
        }
        if !frame.is_valid() {
            return Err(DetectorError::DetectionFailed(format!(
                "frame {} buffer does not match {}x{}",
                frame.sequence(),
                frame.width(),
                frame.height()
            )));
        }
        if self.unit() < self.profile.dropout_probability {
            return Ok(None);
        }

        let ear = if self.eye_closed_at(timestamp_ms) {
            self.profile.closed_ear
        } else {
            self.profile.open_ear
        };
        let jitter = self.profile.jitter;
        let jaw_noise = (self.unit() - 0.5) * jitter;
        let brow_noise = (self.unit() - 0.5) * jitter;

        let geometry = FaceGeometry {
            ear,
            jaw_openness: (self.profile.jaw_openness + jaw_noise).clamp(0.0, 1.0),
            brow_tension: (self.profile.brow_tension + brow_noise).clamp(0.0, 1.0),
        };
        Ok(Some(geometry.landmarks(frame.width(), frame.height())))
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            tracing::info!("Synthetic face detector closed");
        }
    }
}
