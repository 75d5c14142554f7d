//! Median baseline estimation

use super::{Baseline, BaselineMethod};
use crate::window::{Window, WindowStore};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Median of a set of values; the two middle values are averaged for even counts
pub fn median(values: &mut [Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        let (low, high) = (values[mid - 1], values[mid]);
        // Only same-sign extremes overflow the sum, and then the difference fits
        let mid_value = match low.checked_add(high) {
            Some(sum) => sum / Decimal::TWO,
            None => low + (high - low) / Decimal::TWO,
        };
        Some(mid_value)
    } else {
        Some(values[mid])
    }
}

/// Computes and caches the current baseline per instrument
///
/// Recomputes from the full window every call, so the result depends only on
/// window membership and never on insertion order.
#[derive(Debug, Clone)]
pub struct BaselineEstimator {
    min_samples: usize,
    baselines: HashMap<String, Baseline>,
}

impl BaselineEstimator {
    /// Create an estimator requiring `min_samples` before switching to the median
    pub fn new(min_samples: usize) -> Self {
        Self {
            min_samples: min_samples.max(1),
            baselines: HashMap::new(),
        }
    }

    /// Recompute the baseline for an instrument from its window
    ///
    /// Returns `None` only for an empty window. Below `min_samples` the
    /// baseline is the most recent sample's value.
    pub fn baseline_for(
        &mut self,
        instrument_id: &str,
        window: &Window,
        now: DateTime<Utc>,
    ) -> Option<Baseline> {
        let baseline = Self::compute(instrument_id, window, self.min_samples, now)?;
        self.baselines
            .insert(instrument_id.to_string(), baseline.clone());
        Some(baseline)
    }

    fn compute(
        instrument_id: &str,
        window: &Window,
        min_samples: usize,
        now: DateTime<Utc>,
    ) -> Option<Baseline> {
        let latest = window.latest()?;

        let (value, method) = if window.len() < min_samples {
            (latest.volume, BaselineMethod::ColdStart)
        } else {
            let mut values: Vec<Decimal> = window.iter().map(|o| o.volume).collect();
            (median(&mut values)?, BaselineMethod::Median)
        };

        Some(Baseline {
            instrument_id: instrument_id.to_string(),
            value,
            computed_at: now,
            sample_count: window.len(),
            method,
        })
    }

    /// Last computed baseline for an instrument
    pub fn current(&self, instrument_id: &str) -> Option<&Baseline> {
        self.baselines.get(instrument_id)
    }

    /// Discard the cached baseline of an instrument no longer tracked
    pub fn forget(&mut self, instrument_id: &str) {
        self.baselines.remove(instrument_id);
    }

    /// Recompute every instrument held by the store
    pub fn rebuild(&mut self, store: &WindowStore, now: DateTime<Utc>) {
        self.baselines.clear();
        for id in store.instruments() {
            if let Some(window) = store.window(id) {
                self.baseline_for(id, window, now);
            }
        }
    }

    /// All current baselines
    pub fn baselines(&self) -> impl Iterator<Item = &Baseline> {
        self.baselines.values()
    }
}
