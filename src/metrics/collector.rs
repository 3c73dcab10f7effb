//! Metrics collection and registry.

use crate::telemetry::TelemetrySnapshot;
use crate::worker::LifecycleStats;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of system state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Whether the latest snapshot carried measurements rather than an error.
    pub tracking_available: bool,
    /// Latest stress index.
    pub stress_index: Option<f64>,
    /// Latest blinks per minute.
    pub blink_per_minute: Option<u32>,
    /// Latest blinks per ten seconds.
    pub blink_per_ten_seconds: Option<u32>,
    /// Latest smoothed jaw openness.
    pub jaw_openness: Option<f64>,
    /// Latest smoothed brow tension.
    pub brow_tension: Option<f64>,
    /// Active consumers.
    pub consumers: usize,
    /// Whether a worker is attached.
    pub worker_running: bool,
    /// Workers started.
    pub worker_starts: u64,
    /// Workers stopped.
    pub worker_stops: u64,
    /// Snapshots published.
    pub snapshots_published: u64,
}

/// Prometheus metrics registry for telemetry monitoring.
pub struct MetricsRegistry {
    registry: Registry,

    // Signal metrics
    tracking_available: IntGauge,
    stress_index: Gauge,
    blink_per_minute: IntGauge,
    blink_per_ten_seconds: IntGauge,
    jaw_openness: Gauge,
    brow_tension: Gauge,

    // Lifecycle metrics
    consumers: IntGauge,
    worker_running: IntGauge,
    worker_starts_total: IntCounter,
    worker_stops_total: IntCounter,
    snapshots_published_total: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all telemetry metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let tracking_available = IntGauge::new(
            "face_telemetry_tracking_available",
            "Whether face tracking is producing measurements (1) or errors (0)",
        )?;
        let stress_index = Gauge::new(
            "face_telemetry_stress_index",
            "Latest stress index (0-100)",
        )?;
        let blink_per_minute = IntGauge::new(
            "face_telemetry_blink_per_minute",
            "Blinks counted over the last 60 seconds",
        )?;
        let blink_per_ten_seconds = IntGauge::new(
            "face_telemetry_blink_per_ten_seconds",
            "Blinks counted over the last 10 seconds",
        )?;
        let jaw_openness = Gauge::new(
            "face_telemetry_jaw_openness",
            "Smoothed jaw openness (0-1)",
        )?;
        let brow_tension = Gauge::new(
            "face_telemetry_brow_tension",
            "Smoothed brow tension (0-1)",
        )?;

        let consumers = IntGauge::new(
            "face_telemetry_consumers",
            "Number of consumers holding the tracker",
        )?;
        let worker_running = IntGauge::new(
            "face_telemetry_worker_running",
            "Whether a tracking worker is attached",
        )?;
        let worker_starts_total = IntCounter::new(
            "face_telemetry_worker_starts_total",
            "Total tracking workers started",
        )?;
        let worker_stops_total = IntCounter::new(
            "face_telemetry_worker_stops_total",
            "Total tracking workers stopped",
        )?;
        let snapshots_published_total = IntCounter::new(
            "face_telemetry_snapshots_published_total",
            "Total telemetry snapshots published",
        )?;

        registry.register(Box::new(tracking_available.clone()))?;
        registry.register(Box::new(stress_index.clone()))?;
        registry.register(Box::new(blink_per_minute.clone()))?;
        registry.register(Box::new(blink_per_ten_seconds.clone()))?;
        registry.register(Box::new(jaw_openness.clone()))?;
        registry.register(Box::new(brow_tension.clone()))?;
        registry.register(Box::new(consumers.clone()))?;
        registry.register(Box::new(worker_running.clone()))?;
        registry.register(Box::new(worker_starts_total.clone()))?;
        registry.register(Box::new(worker_stops_total.clone()))?;
        registry.register(Box::new(snapshots_published_total.clone()))?;

        Ok(Self {
            registry,
            tracking_available,
            stress_index,
            blink_per_minute,
            blink_per_ten_seconds,
            jaw_openness,
            brow_tension,
            consumers,
            worker_running,
            worker_starts_total,
            worker_stops_total,
            snapshots_published_total,
        })
    }

    /// Updates all metrics from a snapshot of system state.
    ///
    /// Signal gauges keep their previous value when the snapshot has none.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.tracking_available
            .set(if snapshot.tracking_available { 1 } else { 0 });

        if let Some(index) = snapshot.stress_index {
            self.stress_index.set(index);
        }
        if let Some(bpm) = snapshot.blink_per_minute {
            self.blink_per_minute.set(i64::from(bpm));
        }
        if let Some(b10) = snapshot.blink_per_ten_seconds {
            self.blink_per_ten_seconds.set(i64::from(b10));
        }
        if let Some(jaw) = snapshot.jaw_openness {
            self.jaw_openness.set(jaw);
        }
        if let Some(brow) = snapshot.brow_tension {
            self.brow_tension.set(brow);
        }

        self.consumers.set(snapshot.consumers as i64);
        self.worker_running
            .set(if snapshot.worker_running { 1 } else { 0 });

        // Counters only move forward by the difference
        advance(&self.worker_starts_total, snapshot.worker_starts);
        advance(&self.worker_stops_total, snapshot.worker_stops);
        advance(&self.snapshots_published_total, snapshot.snapshots_published);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

impl MetricsSnapshot {
    /// Creates a snapshot from the latest telemetry and lifecycle state.
    pub fn from_components(
        latest: Option<&TelemetrySnapshot>,
        lifecycle: &LifecycleStats,
        snapshots_published: u64,
    ) -> Self {
        let mut snapshot = Self {
            consumers: lifecycle.refcount,
            worker_running: lifecycle.running,
            worker_starts: lifecycle.starts,
            worker_stops: lifecycle.stops,
            snapshots_published,
            ..Self::default()
        };

        if let Some(latest) = latest {
            snapshot.tracking_available = latest.error().is_none();
            snapshot.stress_index = latest.stress_index();
            snapshot.blink_per_minute = latest.blink_per_minute();
            snapshot.blink_per_ten_seconds = latest.blink_per_ten_seconds();
            snapshot.jaw_openness = latest.jaw_openness();
            snapshot.brow_tension = latest.brow_tension();
        }

        snapshot
    }
}
