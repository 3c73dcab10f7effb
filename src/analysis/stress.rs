//! Composite stress scoring.
//!
//! A heuristic, non-medical index. Each available signal contributes a
//! partial score in [0, 1]; the index is their weighted mean scaled to
//! 0-100. Signals that are absent simply drop out of the mean.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Weight of the blink-rate partial score.
pub const BLINK_WEIGHT: f64 = 1.2;
/// Weight of the jaw partial score.
pub const JAW_WEIGHT: f64 = 0.8;
/// Weight of the brow partial score.
pub const BROW_WEIGHT: f64 = 1.5;

/// Index below which stress reads as low.
pub const LOW_BELOW: f64 = 30.0;
/// Index below which stress reads as medium.
pub const MEDIUM_BELOW: f64 = 60.0;

/// Inputs to the scorer, each independently optional.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StressSignals {
    pub blink_per_minute: Option<f64>,
    pub jaw_openness: Option<f64>,
    pub brow_tension: Option<f64>,
}

/// Three-level stress label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressLevel {
    Low,
    Medium,
    High,
}

impl StressLevel {
    /// Buckets a 0-100 index.
    pub fn from_index(index: f64) -> Self {
        if index < LOW_BELOW {
            StressLevel::Low
        } else if index < MEDIUM_BELOW {
            StressLevel::Medium
        } else {
            StressLevel::High
        }
    }

    /// Lowercase label used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            StressLevel::Low => "low",
            StressLevel::Medium => "medium",
            StressLevel::High => "high",
        }
    }
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scorer output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressScore {
    /// Composite index in [0, 100].
    pub index: f64,
    pub level: StressLevel,
}

/// Partial score for a blink rate in blinks per minute.
///
/// 10-22 bpm is the relaxed band; fewer blinks suggest fatigue or
/// fixation, more suggest agitation.
pub fn blink_component(bpm: f64) -> f64 {
    if bpm < 6.0 {
        ((6.0 - bpm) / 6.0).clamp(0.0, 1.0) * 0.9
    } else if bpm < 10.0 {
        ((10.0 - bpm) / 4.0).clamp(0.0, 1.0) * 0.4
    } else if bpm <= 22.0 {
        0.0
    } else if bpm <= 30.0 {
        ((bpm - 22.0) / 8.0).clamp(0.0, 1.0) * 0.5
    } else {
        (0.5 + (bpm - 30.0) / 25.0).clamp(0.0, 1.0)
    }
}

/// Partial score for smoothed jaw openness.
///
/// A clenched jaw scores a flat 0.3; 0.15-0.35 is relaxed; wider
/// openings (talking, yawning) score on two ramps.
pub fn jaw_component(jaw: f64) -> f64 {
    if jaw < 0.15 {
        0.3
    } else if jaw < 0.35 {
        0.0
    } else if jaw < 0.6 {
        ((jaw - 0.35) / 0.25).clamp(0.0, 1.0) * 0.5
    } else {
        ((jaw - 0.6) / 0.4).clamp(0.0, 1.0) * 0.4
    }
}

/// Partial score for smoothed brow tension.
pub fn brow_component(brow: f64) -> f64 {
    brow.clamp(0.0, 1.0)
}

/// Computes the composite score, or `None` if no signal is available.
pub fn score(signals: &StressSignals) -> Option<StressScore> {
    let parts = [
        signals.blink_per_minute.map(|v| (blink_component(v), BLINK_WEIGHT)),
        signals.jaw_openness.map(|v| (jaw_component(v), JAW_WEIGHT)),
        signals.brow_tension.map(|v| (brow_component(v), BROW_WEIGHT)),
    ];

    let (weighted, total_weight) = parts
        .iter()
        .flatten()
        .fold((0.0, 0.0), |(sum, weights), &(part, weight)| {
            (sum + part * weight, weights + weight)
        });

    if total_weight == 0.0 {
        return None;
    }

    let index = (100.0 * weighted / total_weight).clamp(0.0, 100.0);
    Some(StressScore {
        index,
        level: StressLevel::from_index(index),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn signals(bpm: Option<f64>, jaw: Option<f64>, brow: Option<f64>) -> StressSignals {
        StressSignals {
            blink_per_minute: bpm,
            jaw_openness: jaw,
            brow_tension: brow,
        }
    }

    #[test]
    fn test_no_signals_no_score() {
        assert_eq!(score(&StressSignals::default()), None);
    }

    #[test]
    fn test_relaxed_signals_score_zero() {
        let result = score(&signals(Some(16.0), Some(0.2), Some(0.0))).unwrap();
        assert_eq!(result.index, 0.0);
        assert_eq!(result.level, StressLevel::Low);
    }

    #[test]
    fn test_brow_only_full_tension() {
        let result = score(&signals(None, None, Some(1.0))).unwrap();
        assert!((result.index - 100.0).abs() < 1e-9);
        assert_eq!(result.level, StressLevel::High);
    }

    #[test]
    fn test_blink_component_bands() {
        assert!((blink_component(0.0) - 0.9).abs() < 1e-12);
        assert!((blink_component(3.0) - 0.45).abs() < 1e-12);
        assert!((blink_component(6.0) - 0.4).abs() < 1e-12);
        assert!((blink_component(8.0) - 0.2).abs() < 1e-12);
        assert_eq!(blink_component(10.0), 0.0);
        assert_eq!(blink_component(22.0), 0.0);
        assert!((blink_component(26.0) - 0.25).abs() < 1e-12);
        assert!((blink_component(30.0) - 0.5).abs() < 1e-12);
        assert!((blink_component(42.5) - 1.0).abs() < 1e-12);
        assert_eq!(blink_component(100.0), 1.0);
    }

    #[test]
    fn test_jaw_component_bands() {
        assert_eq!(jaw_component(0.0), 0.3);
        assert_eq!(jaw_component(0.15), 0.0);
        assert_eq!(jaw_component(0.34), 0.0);
        assert!((jaw_component(0.475) - 0.25).abs() < 1e-12);
        assert_eq!(jaw_component(0.6), 0.0);
        assert!((jaw_component(1.0) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_mean() {
        // blink 0.9 * 1.2 + brow 0.5 * 1.5 over 2.7
        let result = score(&signals(Some(0.0), None, Some(0.5))).unwrap();
        let expected = 100.0 * (0.9 * 1.2 + 0.5 * 1.5) / 2.7;
        assert!((result.index - expected).abs() < 1e-9);
        assert_eq!(result.level, StressLevel::High);
    }

    #[test]
    fn test_level_boundaries() {
        assert_eq!(StressLevel::from_index(29.999), StressLevel::Low);
        assert_eq!(StressLevel::from_index(30.0), StressLevel::Medium);
        assert_eq!(StressLevel::from_index(59.999), StressLevel::Medium);
        assert_eq!(StressLevel::from_index(60.0), StressLevel::High);
    }

    #[test]
    fn test_level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&StressLevel::Medium).unwrap(), "\"medium\"");
        assert_eq!(StressLevel::High.to_string(), "high");
    }

    proptest! {
        #[test]
        fn prop_index_in_range(
            bpm in proptest::option::of(0.0f64..120.0),
            jaw in proptest::option::of(-0.5f64..1.5),
            brow in proptest::option::of(-0.5f64..1.5),
        ) {
            let input = signals(bpm, jaw, brow);
            match score(&input) {
                None => prop_assert!(bpm.is_none() && jaw.is_none() && brow.is_none()),
                Some(result) => {
                    prop_assert!((0.0..=100.0).contains(&result.index));
                    prop_assert_eq!(result.level, StressLevel::from_index(result.index));
                }
            }
        }
    }
}
