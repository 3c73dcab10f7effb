//! Exponential smoothing of per-frame measurements.

/// Weight of the newest sample.
pub const SMOOTHING_ALPHA: f64 = 0.3;

/// Exponential moving average seeded by its first sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ema {
    alpha: f64,
    value: Option<f64>,
}

impl Ema {
    /// Empty average with the given decay.
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            value: None,
        }
    }

    /// Folds in one sample and returns the new smoothed value.
    ///
    /// The first sample is taken as-is, so there is no start-up lag.
    pub fn update(&mut self, raw: f64) -> f64 {
        let next = match self.value {
            None => raw,
            Some(prev) => self.alpha * raw + (1.0 - self.alpha) * prev,
        };
        self.value = Some(next);
        next
    }

    /// Current smoothed value, `None` until seeded.
    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

/// Smoothed jaw and brow values for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SmoothedSignals {
    pub jaw_openness: Option<f64>,
    pub brow_tension: Option<f64>,
}

/// Independent EMA channels for jaw openness and brow tension.
#[derive(Debug, Clone)]
pub struct SmoothingFilter {
    jaw: Ema,
    brow: Ema,
}

impl SmoothingFilter {
    /// Filter with the default decay on both channels.
    pub fn new() -> Self {
        Self::with_alpha(SMOOTHING_ALPHA)
    }

    /// Filter with a custom decay on both channels.
    pub fn with_alpha(alpha: f64) -> Self {
        Self {
            jaw: Ema::new(alpha),
            brow: Ema::new(alpha),
        }
    }

    /// Updates whichever channels have a raw sample this tick.
    ///
    /// An absent sample leaves that channel's state untouched (no decay
    /// toward zero) and reports `None` for the tick.
    pub fn update(&mut self, jaw: Option<f64>, brow: Option<f64>) -> SmoothedSignals {
        SmoothedSignals {
            jaw_openness: jaw.map(|raw| self.jaw.update(raw)),
            brow_tension: brow.map(|raw| self.brow.update(raw)),
        }
    }

    /// Last smoothed jaw value, regardless of the latest tick.
    pub fn jaw(&self) -> Option<f64> {
        self.jaw.value()
    }

    /// Last smoothed brow value, regardless of the latest tick.
    pub fn brow(&self) -> Option<f64> {
        self.brow.value()
    }
}

impl Default for SmoothingFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_sample_seeds_exactly() {
        let mut ema = Ema::new(SMOOTHING_ALPHA);
        assert_eq!(ema.value(), None);
        assert_eq!(ema.update(0.42), 0.42);
    }

    #[test]
    fn test_decay_formula() {
        let mut ema = Ema::new(0.3);
        ema.update(1.0);
        let next = ema.update(0.0);
        assert!((next - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_absent_sample_holds_state() {
        let mut filter = SmoothingFilter::new();
        filter.update(Some(0.5), Some(0.8));

        let out = filter.update(None, None);
        assert_eq!(out, SmoothedSignals::default());
        assert_eq!(filter.jaw(), Some(0.5));
        assert_eq!(filter.brow(), Some(0.8));

        // Resumes from the held value, not from zero
        let out = filter.update(Some(0.5), None);
        assert_eq!(out.jaw_openness, Some(0.5));
        assert_eq!(out.brow_tension, None);
    }

    #[test]
    fn test_channels_independent() {
        let mut filter = SmoothingFilter::new();
        filter.update(Some(0.2), None);
        assert_eq!(filter.jaw(), Some(0.2));
        assert_eq!(filter.brow(), None);
    }

    proptest! {
        #[test]
        fn prop_constant_input_converges(seed in 0.0f64..1.0, v in 0.0f64..1.0) {
            let mut ema = Ema::new(SMOOTHING_ALPHA);
            ema.update(seed);
            let mut last = seed;
            for _ in 0..200 {
                last = ema.update(v);
            }
            prop_assert!((last - v).abs() < 1e-9);
        }

        #[test]
        fn prop_stays_within_input_range(samples in proptest::collection::vec(0.0f64..1.0, 1..100)) {
            let mut ema = Ema::new(SMOOTHING_ALPHA);
            for s in samples {
                let out = ema.update(s);
                prop_assert!((0.0..=1.0).contains(&out));
            }
        }
    }
}
