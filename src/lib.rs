//! Face Telemetry Library
//!
//! Turns a live stream of facial-landmark observations into a bounded-rate,
//! thread-safe telemetry feed: blink rate, jaw openness, brow tension and a
//! composite stress score.
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! capture → landmarks → extraction → analysis → telemetry
//!    └──────────── worker (one background thread) ─────┘
//! ```
//!
//! A single worker thread is shared by all consumers. It starts when the
//! first consumer acquires the [`TelemetryService`] and is told to stop
//! when the last one releases it. The worker publishes every tick into a
//! single-slot publisher; consumers either read the latest snapshot or
//! iterate a pull-paced [`SnapshotStream`].
//!
//! # Design Principles
//!
//! - **Never block the worker**: readers only copy out the latest snapshot
//! - **Degrade, don't fail**: missing camera or model yields error snapshots
//! - **Fresh history per worker**: a restarted worker forgets earlier blinks
//! - **No clinical claims**: the stress index is a heuristic
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use face_telemetry::{SyntheticBackend, TelemetryService, TrackerConfig};
//! use face_telemetry::worker::StopSignal;
//!
//! let service = TelemetryService::new(
//!     TrackerConfig::default(),
//!     Arc::new(SyntheticBackend::default()),
//! );
//!
//! let session = service.session();
//! for snapshot in session.stream(10, StopSignal::new()).take(50).flatten() {
//!     match snapshot.error() {
//!         Some(reason) => println!("tracking unavailable: {}", reason),
//!         None => println!("stress {:?} ({:?})", snapshot.stress_index(), snapshot.stress_level()),
//!     }
//! }
//! // Dropping the session releases the tracker
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod capture;
pub mod extraction;
pub mod landmarks;
pub mod metrics;
pub mod telemetry;
pub mod worker;

// Re-export commonly used types at crate root
pub use analysis::{BlinkDetector, SmoothingFilter, StressLevel, StressScore};
pub use capture::{Camera, CaptureConfig, FileConfig, Frame, MockCamera, TrackerConfig};
pub use extraction::RawSignals;
pub use landmarks::{FaceLandmarks, LandmarkDetector, LandmarkId, SyntheticFaceDetector};
pub use telemetry::{SnapshotStream, TelemetryPublisher, TelemetrySnapshot};
pub use worker::{
    LifecycleStats, StopSignal, SyntheticBackend, TelemetryService, TelemetrySession,
    TrackerBackend,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
