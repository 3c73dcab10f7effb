//! Prometheus metrics exporter for telemetry monitoring.
//!
//! Mirrors the latest telemetry snapshot and the worker lifecycle into
//! Prometheus gauges and counters, optionally served over HTTP.
//!
//! # Metrics Exposed
//!
//! ## Signal Metrics
//! - `face_telemetry_tracking_available` - 1 while measurements flow, 0 on error
//! - `face_telemetry_stress_index` - Latest stress index (0-100)
//! - `face_telemetry_blink_per_minute` - Blinks in the last 60 s
//! - `face_telemetry_blink_per_ten_seconds` - Blinks in the last 10 s
//! - `face_telemetry_jaw_openness` - Smoothed jaw openness
//! - `face_telemetry_brow_tension` - Smoothed brow tension
//!
//! ## Lifecycle Metrics
//! - `face_telemetry_consumers` - Consumers holding the tracker
//! - `face_telemetry_worker_running` - Whether a worker is attached
//! - `face_telemetry_worker_starts_total` - Workers started
//! - `face_telemetry_worker_stops_total` - Workers stopped
//! - `face_telemetry_snapshots_published_total` - Snapshots published
//!
//! # Example
//!
//! ```no_run
//! use face_telemetry::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! let snapshot = MetricsSnapshot {
//!     tracking_available: true,
//!     stress_index: Some(35.0),
//!     blink_per_minute: Some(18),
//!     consumers: 1,
//!     worker_running: true,
//!     worker_starts: 1,
//!     ..Default::default()
//! };
//!
//! registry.update(&snapshot);
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, MetricsState, ServerError};
