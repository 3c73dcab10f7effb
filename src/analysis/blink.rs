//! Blink detection.
//!
//! A two-state hysteresis machine over the eye aspect ratio. The eye
//! counts as closed once EAR drops below the close threshold and as open
//! again only once it rises above the (higher) open threshold; the
//! closed-to-open transition is the blink. Blink times are kept for one
//! minute to derive the per-minute and per-ten-second counts.

use std::collections::VecDeque;

/// EAR below which an open eye becomes closed.
pub const CLOSE_THRESHOLD: f64 = 0.20;
/// EAR above which a closed eye reopens (and a blink is counted).
pub const OPEN_THRESHOLD: f64 = 0.225;
/// Retention window for blink events, in seconds.
pub const MINUTE_WINDOW_S: f64 = 60.0;
/// Short responsive window, in seconds.
pub const SHORT_WINDOW_S: f64 = 10.0;

/// Eye state tracked by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeState {
    Open,
    Closed,
}

/// Sliding-window blink counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkCounts {
    /// Blinks in the last 60 seconds.
    pub per_minute: u32,
    /// Blinks in the last 10 seconds.
    pub per_ten_seconds: u32,
}

/// Result of one detector update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkUpdate {
    /// True if this update completed a blink.
    pub blinked: bool,
    /// Window counts, absent until the first EAR sample has been seen.
    pub counts: Option<BlinkCounts>,
}

/// Hysteresis blink detector with a one-minute event window.
#[derive(Debug, Clone)]
pub struct BlinkDetector {
    close_threshold: f64,
    open_threshold: f64,
    state: EyeState,
    /// Blink times in seconds, ascending.
    events: VecDeque<f64>,
    /// Set once any EAR sample has been processed.
    primed: bool,
}

impl BlinkDetector {
    /// Detector with the default thresholds.
    pub fn new() -> Self {
        Self {
            close_threshold: CLOSE_THRESHOLD,
            open_threshold: OPEN_THRESHOLD,
            state: EyeState::Open,
            events: VecDeque::new(),
            primed: false,
        }
    }

    /// Creates a detector with custom thresholds.
    ///
    /// Returns `None` unless `open > close`; equal thresholds would let
    /// the state flicker on noise around a single boundary.
    pub fn with_thresholds(close: f64, open: f64) -> Option<Self> {
        (open > close).then(|| Self {
            close_threshold: close,
            open_threshold: open,
            ..Self::new()
        })
    }

    /// Advances the detector to time `now` (seconds, monotonic).
    ///
    /// `ear` is `None` on frames without a face: the state machine holds
    /// still but the windows are still pruned and counted.
    pub fn update(&mut self, ear: Option<f64>, now: f64) -> BlinkUpdate {
        let mut blinked = false;

        if let Some(ear) = ear {
            self.primed = true;
            match self.state {
                EyeState::Open if ear < self.close_threshold => {
                    self.state = EyeState::Closed;
                }
                EyeState::Closed if ear > self.open_threshold => {
                    self.state = EyeState::Open;
                    self.events.push_back(now);
                    blinked = true;
                    tracing::trace!(ear, at = now, "Blink detected");
                }
                _ => {}
            }
        }

        self.prune(now);

        BlinkUpdate {
            blinked,
            counts: self.primed.then(|| self.counts(now)),
        }
    }

    fn prune(&mut self, now: f64) {
        let cutoff = now - MINUTE_WINDOW_S;
        while self.events.front().is_some_and(|&t| t < cutoff) {
            self.events.pop_front();
        }
    }

    fn counts(&self, now: f64) -> BlinkCounts {
        let cutoff = now - SHORT_WINDOW_S;
        let recent = self.events.iter().rev().take_while(|&&t| t >= cutoff).count();
        BlinkCounts {
            per_minute: self.events.len() as u32,
            per_ten_seconds: recent as u32,
        }
    }

    /// Current eye state.
    pub fn state(&self) -> EyeState {
        self.state
    }

    /// Retained blink times, oldest first.
    pub fn events(&self) -> impl Iterator<Item = f64> + '_ {
        self.events.iter().copied()
    }
}

impl Default for BlinkDetector {
    fn default() -> Self {
        Self::new()
    }
}
