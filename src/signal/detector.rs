//! Spike detection

use super::SpikeResult;
use rust_decimal::Decimal;

/// Classify `current` against `baseline`
///
/// A zero baseline never yields a spike and reports a multiplier of 1.
pub fn classify(current: Decimal, baseline: Decimal, threshold: Decimal) -> SpikeResult {
    if baseline.is_zero() {
        return SpikeResult::neutral();
    }

    // A ratio too large to represent is still a spike
    let multiplier = current.checked_div(baseline).unwrap_or(Decimal::MAX);
    SpikeResult {
        is_spike: multiplier >= threshold,
        multiplier,
    }
}

/// Spike classifier with a fixed threshold
#[derive(Debug, Clone, Copy)]
pub struct SpikeDetector {
    threshold: Decimal,
}

impl SpikeDetector {
    /// Create a detector; `threshold` must be positive (checked by config validation)
    pub fn new(threshold: Decimal) -> Self {
        Self { threshold }
    }

    /// Configured threshold multiplier
    pub fn threshold(&self) -> Decimal {
        self.threshold
    }

    /// Classify an observation value against a baseline value
    pub fn classify(&self, current: Decimal, baseline: Decimal) -> SpikeResult {
        classify(current, baseline, self.threshold)
    }
}
