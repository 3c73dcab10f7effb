//! The tracking worker loop.

use super::pipeline::{probe, Capability, CapabilityError, Pipeline, TrackerBackend};
use super::StopSignal;
use crate::analysis::{stress, BlinkDetector, SmoothingFilter, StressSignals};
use crate::capture::TrackerConfig;
use crate::extraction::RawSignals;
use crate::landmarks::FaceLandmarks;
use crate::telemetry::{SnapshotWriter, TelemetrySnapshot};
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

/// One worker instance: capability check, then degraded or steady
/// state, then teardown.
///
/// Blink and smoothing state belong to the instance, so a restarted
/// worker starts from an empty history.
pub struct Worker {
    config: TrackerConfig,
    writer: SnapshotWriter,
    stop: StopSignal,
    blink: BlinkDetector,
    smoothing: SmoothingFilter,
    /// Monotonic origin for blink times and detector timestamps.
    clock: Instant,
}

impl Worker {
    /// Creates a worker publishing through `writer` until `stop` is raised.
    pub fn new(config: TrackerConfig, writer: SnapshotWriter, stop: StopSignal) -> Self {
        Self {
            config,
            writer,
            stop,
            blink: BlinkDetector::new(),
            smoothing: SmoothingFilter::new(),
            clock: Instant::now(),
        }
    }

    /// Runs until the stop signal is raised.
    pub fn run(mut self, backend: &dyn TrackerBackend) {
        match probe(backend, &self.config) {
            Capability::Available(pipeline) => {
                info!(
                    generation = self.writer.generation(),
                    fps = self.config.capture.fps,
                    "Tracking worker running"
                );
                self.run_steady(pipeline);
            }
            Capability::Unavailable(reason) => self.run_degraded(&reason),
        }
        info!(generation = self.writer.generation(), "Tracking worker stopped");
    }

    /// Publishes an error snapshot every degraded interval until stopped.
    ///
    /// No recovery is attempted; a fresh worker re-probes.
    fn run_degraded(&self, reason: &CapabilityError) {
        warn!(error = %reason, "Face tracking unavailable");
        let message = reason.to_string();
        let interval = self.config.degraded_interval();

        while !self.stop.is_raised() {
            self.writer
                .publish(TelemetrySnapshot::unavailable(Utc::now(), message.clone()));
            if self.stop.wait_timeout(interval) {
                break;
            }
        }
    }

    /// Capture, detect, analyse and publish at the target frame rate.
    ///
    /// `pipeline` is dropped on every exit path, releasing the camera and
    /// detector.
    fn run_steady(&mut self, mut pipeline: Pipeline) {
        let min_interval = self.config.capture.frame_interval();
        let retry = self.config.frame_retry();

        while !self.stop.is_raised() {
            let t0 = Instant::now();

            let frame = match pipeline.camera().capture() {
                Ok(frame) => frame,
                Err(e) => {
                    if e.is_transient() {
                        debug!(error = %e, "Frame read failed, retrying");
                    } else {
                        warn!(error = %e, "Camera error, retrying");
                    }
                    if self.stop.wait_timeout(retry) {
                        break;
                    }
                    continue;
                }
            };

            let timestamp_ms = self.clock.elapsed().as_millis() as u64;
            // A failed detection counts as a miss for this tick
            let face = match pipeline.detector().detect(&frame, timestamp_ms) {
                Ok(face) => face,
                Err(e) => {
                    warn!(error = %e, sequence = frame.sequence(), "Landmark detection failed");
                    None
                }
            };

            let now = self.clock.elapsed().as_secs_f64();
            let snapshot = self.process(face.as_ref(), frame.width(), frame.height(), now);
            if !self.writer.publish(snapshot) {
                debug!("Publisher generation superseded, exiting");
                break;
            }

            let elapsed = t0.elapsed();
            if elapsed < min_interval && self.stop.wait_timeout(min_interval - elapsed) {
                break;
            }
        }
    }

    /// Turns one detection result into a snapshot.
    ///
    /// A missing face (or a face missing required landmarks) yields no
    /// raw sample: blink counts still come from earlier events, jaw and
    /// brow are empty for the tick, and the score uses what remains.
    pub fn process(
        &mut self,
        face: Option<&FaceLandmarks>,
        width: u32,
        height: u32,
        now: f64,
    ) -> TelemetrySnapshot {
        let raw = face.and_then(|f| RawSignals::from_landmarks(f, width, height));

        let blink = self.blink.update(raw.map(|r| r.ear), now);
        let smoothed = self
            .smoothing
            .update(raw.map(|r| r.jaw_openness), raw.map(|r| r.brow_tension));

        let score = stress::score(&StressSignals {
            blink_per_minute: blink.counts.map(|c| f64::from(c.per_minute)),
            jaw_openness: smoothed.jaw_openness,
            brow_tension: smoothed.brow_tension,
        });

        trace!(
            face = raw.is_some(),
            ear = raw.map(|r| r.ear),
            blinked = blink.blinked,
            stress = score.map(|s| s.index),
            "Tick processed"
        );

        TelemetrySnapshot::measured(Utc::now(), blink.counts, smoothed, score)
    }
}
