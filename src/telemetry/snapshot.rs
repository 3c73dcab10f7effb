//! Telemetry snapshot record.

use crate::analysis::{BlinkCounts, SmoothedSignals, StressLevel, StressScore};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One immutable, fully formed telemetry reading.
///
/// Snapshots are only built through [`TelemetrySnapshot::measured`] and
/// [`TelemetrySnapshot::unavailable`], so an error-tagged snapshot never
/// carries numeric fields. Serializes to the camelCase wire shape
/// streaming consumers expect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    #[serde(rename = "ts", with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
    ok: bool,
    #[serde(rename = "blinkPerMin")]
    blink_per_minute: Option<u32>,
    #[serde(rename = "blinkPer10s")]
    blink_per_ten_seconds: Option<u32>,
    jaw_openness: Option<f64>,
    brow_tension: Option<f64>,
    stress_index: Option<f64>,
    #[serde(rename = "level")]
    stress_level: Option<StressLevel>,
    error: Option<String>,
}

impl TelemetrySnapshot {
    /// Snapshot from one steady-state tick.
    pub fn measured(
        timestamp: DateTime<Utc>,
        blinks: Option<BlinkCounts>,
        smoothed: SmoothedSignals,
        score: Option<StressScore>,
    ) -> Self {
        let blink_per_minute = blinks.map(|c| c.per_minute);
        let ok = score.is_some() || blink_per_minute.is_some() || smoothed.jaw_openness.is_some();
        Self {
            timestamp,
            ok,
            blink_per_minute,
            blink_per_ten_seconds: blinks.map(|c| c.per_ten_seconds),
            jaw_openness: smoothed.jaw_openness,
            brow_tension: smoothed.brow_tension,
            stress_index: score.map(|s| s.index),
            stress_level: score.map(|s| s.level),
            error: None,
        }
    }

    /// Error-tagged snapshot with every numeric field empty.
    pub fn unavailable(timestamp: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self {
            timestamp,
            ok: false,
            blink_per_minute: None,
            blink_per_ten_seconds: None,
            jaw_openness: None,
            brow_tension: None,
            stress_index: None,
            stress_level: None,
            error: Some(reason.into()),
        }
    }

    /// When the snapshot was built.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// True when there is no error and at least one of stress index,
    /// blink rate or jaw openness is present.
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// Blinks in the last 60 s.
    pub fn blink_per_minute(&self) -> Option<u32> {
        self.blink_per_minute
    }

    /// Blinks in the last 10 s.
    pub fn blink_per_ten_seconds(&self) -> Option<u32> {
        self.blink_per_ten_seconds
    }

    /// Smoothed jaw openness in [0, 1].
    pub fn jaw_openness(&self) -> Option<f64> {
        self.jaw_openness
    }

    /// Smoothed brow tension in [0, 1].
    pub fn brow_tension(&self) -> Option<f64> {
        self.brow_tension
    }

    /// Composite stress index in [0, 100].
    pub fn stress_index(&self) -> Option<f64> {
        self.stress_index
    }

    /// Stress band for the index.
    pub fn stress_level(&self) -> Option<StressLevel> {
        self.stress_level
    }

    /// Why tracking is unavailable, if it is.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
