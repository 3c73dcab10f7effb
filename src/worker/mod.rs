//! Background tracking worker and its lifecycle.
//!
//! A single worker thread owns the camera and landmark detector. It is
//! started when the first consumer acquires the [`TelemetryService`] and
//! signalled to stop when the last one releases it. Each worker instance
//! probes its capabilities once, then either runs the capture/analysis
//! loop or publishes error snapshots until stopped.

mod lifecycle;
mod pipeline;
mod runner;
mod stop;

pub use lifecycle::{LifecycleStats, TelemetryService, TelemetrySession};
pub use pipeline::{
    probe, Capability, CapabilityError, Pipeline, SyntheticBackend, TrackerBackend,
    MIN_MODEL_BYTES,
};
pub use runner::Worker;
pub use stop::StopSignal;
