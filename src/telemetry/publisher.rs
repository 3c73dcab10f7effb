//! Single-slot snapshot publication.

use super::TelemetrySnapshot;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Slot {
    /// Generation allowed to write.
    generation: u64,
    latest: Option<Arc<TelemetrySnapshot>>,
    published: u64,
}

/// Holds the most recent snapshot for any number of readers.
///
/// The worker is the only writer. Readers take the lock just long enough
/// to clone an `Arc`, so they never wait on capture or detection.
#[derive(Debug, Default)]
pub struct TelemetryPublisher {
    slot: Mutex<Slot>,
}

impl TelemetryPublisher {
    /// Creates an empty publisher.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the latest snapshot, or `None` before the first tick.
    pub fn latest(&self) -> Option<Arc<TelemetrySnapshot>> {
        self.slot().latest.clone()
    }

    /// Number of snapshots accepted so far.
    pub fn published_count(&self) -> u64 {
        self.slot().published
    }

    /// Opens a new write generation and returns its writer.
    ///
    /// Writers from earlier generations are rejected from here on, so a
    /// stopped worker still finishing its last tick cannot overwrite
    /// what its successor publishes.
    pub fn writer(self: &Arc<Self>) -> SnapshotWriter {
        let mut slot = self.slot();
        slot.generation += 1;
        SnapshotWriter {
            publisher: Arc::clone(self),
            generation: slot.generation,
        }
    }
}

/// Write handle owned by one worker instance.
#[derive(Debug)]
pub struct SnapshotWriter {
    publisher: Arc<TelemetryPublisher>,
    generation: u64,
}

impl SnapshotWriter {
    /// Atomically replaces the latest snapshot.
    ///
    /// Returns false if a newer writer has superseded this one.
    pub fn publish(&self, snapshot: TelemetrySnapshot) -> bool {
        let mut slot = self.publisher.slot();
        if slot.generation != self.generation {
            return false;
        }
        slot.latest = Some(Arc::new(snapshot));
        slot.published += 1;
        true
    }

    /// Generation this writer publishes under.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
