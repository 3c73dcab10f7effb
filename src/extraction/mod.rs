//! Signal extraction from face landmarks.
//!
//! Converts one detected face into the three raw per-frame measurements
//! the rest of the pipeline consumes: eye aspect ratio (for blink
//! detection), jaw openness and brow tension (for smoothing and scoring).

pub mod geometry;

use crate::landmarks::{FaceLandmarks, LandmarkId, Point2};

/// Raw, unsmoothed measurements for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSignals {
    /// Eye aspect ratio; lower means a more closed eye.
    pub ear: f64,
    /// Jaw openness in [0, 1].
    pub jaw_openness: f64,
    /// Brow tension in [0, 1].
    pub brow_tension: f64,
}

impl RawSignals {
    /// Extracts raw signals from normalized landmarks.
    ///
    /// Landmarks are scaled to the frame's pixel dimensions first, so the
    /// ratios are computed in the image's true aspect. Returns `None` when
    /// any required landmark is missing.
    pub fn from_landmarks(face: &FaceLandmarks, width: u32, height: u32) -> Option<Self> {
        let pt = |id: LandmarkId| -> Option<Point2> {
            face.get(id).map(|p| p.to_pixels(width, height))
        };

        let eye = [
            pt(LandmarkId::EyeOuter)?,
            pt(LandmarkId::EyeUpperOuter)?,
            pt(LandmarkId::EyeUpperInner)?,
            pt(LandmarkId::EyeInner)?,
            pt(LandmarkId::EyeLowerInner)?,
            pt(LandmarkId::EyeLowerOuter)?,
        ];
        let scale = geometry::face_scale(pt(LandmarkId::NoseTip)?, pt(LandmarkId::Chin)?);

        Some(Self {
            ear: geometry::eye_aspect_ratio(eye),
            jaw_openness: geometry::jaw_openness(
                pt(LandmarkId::UpperLip)?,
                pt(LandmarkId::LowerLip)?,
                scale,
            ),
            brow_tension: geometry::brow_tension(
                pt(LandmarkId::BrowMid)?,
                pt(LandmarkId::EyeTop)?,
                scale,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::FaceGeometry;

    #[test]
    fn test_synthetic_geometry_round_trips() {
        let geometry = FaceGeometry {
            ear: 0.27,
            jaw_openness: 0.4,
            brow_tension: 0.6,
        };
        let face = geometry.landmarks(640, 480);
        let raw = RawSignals::from_landmarks(&face, 640, 480).unwrap();

        assert!((raw.ear - 0.27).abs() < 1e-4);
        assert!((raw.jaw_openness - 0.4).abs() < 1e-4);
        assert!((raw.brow_tension - 0.6).abs() < 1e-4);
    }

    #[test]
    fn test_missing_landmark_yields_none() {
        let face = FaceGeometry::default().landmarks(640, 480);
        let mut partial = FaceLandmarks::new();
        for id in LandmarkId::ALL {
            if id != LandmarkId::Chin {
                partial.insert(id, face.get(id).unwrap());
            }
        }
        assert!(RawSignals::from_landmarks(&partial, 640, 480).is_none());
    }

    #[test]
    fn test_closed_eye_low_ear() {
        let face = FaceGeometry {
            ear: 0.1,
            ..FaceGeometry::default()
        }
        .landmarks(1280, 720);
        let raw = RawSignals::from_landmarks(&face, 1280, 720).unwrap();
        assert!(raw.ear < 0.2);
    }
}
