//! Named facial landmark points.

use std::collections::HashMap;

/// A 2D landmark position in normalized image coordinates.
///
/// `x` runs left to right and `y` top to bottom, both nominally in
/// `[0, 1]` relative to the frame width and height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    /// Creates a point from normalized coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Converts normalized coordinates to pixels.
    #[inline]
    pub fn to_pixels(self, width: u32, height: u32) -> Self {
        Self {
            x: self.x * f64::from(width),
            y: self.y * f64::from(height),
        }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(self, other: Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Landmarks consumed by the signal extractor.
///
/// Each name maps onto one vertex of the standard 468-point face mesh.
/// The six eye points follow the usual eye-aspect-ratio ordering
/// (p1 outer corner through p6 lower outer lid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LandmarkId {
    EyeOuter,
    EyeUpperOuter,
    EyeUpperInner,
    EyeInner,
    EyeLowerInner,
    EyeLowerOuter,
    UpperLip,
    LowerLip,
    NoseTip,
    Chin,
    BrowMid,
    EyeTop,
}

impl LandmarkId {
    /// Every landmark the extractor reads.
    pub const ALL: [LandmarkId; 12] = [
        LandmarkId::EyeOuter,
        LandmarkId::EyeUpperOuter,
        LandmarkId::EyeUpperInner,
        LandmarkId::EyeInner,
        LandmarkId::EyeLowerInner,
        LandmarkId::EyeLowerOuter,
        LandmarkId::UpperLip,
        LandmarkId::LowerLip,
        LandmarkId::NoseTip,
        LandmarkId::Chin,
        LandmarkId::BrowMid,
        LandmarkId::EyeTop,
    ];

    /// Index of this landmark in the 468-point face mesh.
    pub const fn mesh_index(self) -> usize {
        match self {
            LandmarkId::EyeOuter => 33,
            LandmarkId::EyeUpperOuter => 160,
            LandmarkId::EyeUpperInner => 158,
            LandmarkId::EyeInner => 133,
            LandmarkId::EyeLowerInner => 153,
            LandmarkId::EyeLowerOuter => 144,
            LandmarkId::UpperLip => 13,
            LandmarkId::LowerLip => 14,
            LandmarkId::NoseTip => 1,
            LandmarkId::Chin => 152,
            LandmarkId::BrowMid => 105,
            LandmarkId::EyeTop => 159,
        }
    }
}

/// One detected face: a set of named landmark points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceLandmarks {
    points: HashMap<LandmarkId, Point2>,
}

impl FaceLandmarks {
    /// Creates an empty landmark set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks the named points out of a full face-mesh result.
    ///
    /// Vertices missing from a short mesh are simply left out.
    pub fn from_mesh(mesh: &[Point2]) -> Self {
        let points = LandmarkId::ALL
            .iter()
            .filter_map(|&id| mesh.get(id.mesh_index()).map(|&p| (id, p)))
            .collect();
        Self { points }
    }

    /// Builder-style insert.
    pub fn with(mut self, id: LandmarkId, point: Point2) -> Self {
        self.insert(id, point);
        self
    }

    /// Sets or replaces one landmark.
    pub fn insert(&mut self, id: LandmarkId, point: Point2) {
        self.points.insert(id, point);
    }

    /// Returns a landmark if present.
    pub fn get(&self, id: LandmarkId) -> Option<Point2> {
        self.points.get(&id).copied()
    }

    /// True if every landmark in [`LandmarkId::ALL`] is present.
    pub fn is_complete(&self) -> bool {
        LandmarkId::ALL.iter().all(|id| self.points.contains_key(id))
    }

    /// Number of landmarks present.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no landmark is present.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
