//! Signal analysis.
//!
//! Per-frame raw measurements become telemetry here: blink events and
//! window counts from the eye aspect ratio, smoothed jaw and brow values,
//! and the composite stress score built from them.

pub mod blink;
pub mod smoothing;
pub mod stress;

pub use blink::{BlinkCounts, BlinkDetector, BlinkUpdate, EyeState};
pub use smoothing::{Ema, SmoothedSignals, SmoothingFilter};
pub use stress::{StressLevel, StressScore, StressSignals};
