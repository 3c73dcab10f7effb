//! Telemetry publication.
//!
//! The worker writes each [`TelemetrySnapshot`] into a single-slot
//! [`TelemetryPublisher`]; consumers read it directly or through a
//! pull-paced [`SnapshotStream`].

mod bridge;
mod publisher;
mod snapshot;

pub use bridge::SnapshotStream;
pub use publisher::{SnapshotWriter, TelemetryPublisher};
pub use snapshot::TelemetrySnapshot;
