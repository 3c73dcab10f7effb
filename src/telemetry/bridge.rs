//! Pull-paced snapshot stream for consumers.

use super::{TelemetryPublisher, TelemetrySnapshot};
use crate::capture::MAX_FPS;
use crate::worker::StopSignal;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Lazy iterator over the latest published snapshot.
///
/// The first item is yielded immediately; each later call waits out the
/// rest of the interval, then yields whatever the publisher holds at that
/// moment. The same snapshot may repeat if the worker has not ticked, and
/// items are `None` until the worker has published anything. Iteration
/// ends once the cancel signal is raised. The stream only reads the
/// publisher, so a slow consumer never holds back the worker.
#[derive(Debug)]
pub struct SnapshotStream {
    publisher: Arc<TelemetryPublisher>,
    interval: Duration,
    next_tick: Option<Instant>,
    cancel: StopSignal,
}

impl SnapshotStream {
    /// Creates a stream yielding at most `fps` items per second.
    pub fn new(publisher: Arc<TelemetryPublisher>, fps: u32, cancel: StopSignal) -> Self {
        let fps = fps.clamp(1, MAX_FPS);
        Self {
            publisher,
            interval: Duration::from_secs_f64(1.0 / f64::from(fps)),
            next_tick: None,
            cancel,
        }
    }

    /// Time between yielded items.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Iterator for SnapshotStream {
    type Item = Option<Arc<TelemetrySnapshot>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(deadline) = self.next_tick {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if self.cancel.wait_timeout(remaining) {
                return None;
            }
        } else if self.cancel.is_raised() {
            return None;
        }

        self.next_tick = Some(Instant::now() + self.interval);
        Some(self.publisher.latest())
    }
}
