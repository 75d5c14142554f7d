//! Monitor loop module
//!
//! Drives polling cycles: fetch, window update, baseline refresh, spike test,
//! gated notification and state persistence.

mod runner;

pub use runner::MonitorLoop;

use crate::config::{
    Config, MAX_COOLDOWN_MINUTES, MAX_EXPORT_INTERVAL_MINUTES, MAX_HORIZON_HOURS,
    MAX_POLL_INTERVAL_MINUTES,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Duration;

/// Loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopPhase {
    /// Seeding baselines; spikes are not evaluated
    Priming,
    /// Steady state
    Polling,
}

/// Runtime parameters of the monitor
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub threshold: Decimal,
    pub cooldown: chrono::Duration,
    pub horizon: chrono::Duration,
    pub min_samples: usize,
    pub detailed_history_cap: usize,
    /// Sleep between cycles
    pub poll_interval: Duration,
    /// Upper bound on a single fetch, retries included
    pub fetch_budget: Duration,
    /// Interval between periodic exports
    pub export_interval: chrono::Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Durations are clamped to the limits `Config::validate` enforces
impl From<&Config> for MonitorSettings {
    fn from(config: &Config) -> Self {
        let m = &config.monitor;
        let cooldown_minutes = m.cooldown_minutes.min(MAX_COOLDOWN_MINUTES);
        let horizon_hours = m.horizon_hours.min(MAX_HORIZON_HOURS);
        let poll_minutes = m.poll_interval_minutes.min(MAX_POLL_INTERVAL_MINUTES);
        let export_minutes = config.export.interval_minutes.min(MAX_EXPORT_INTERVAL_MINUTES);

        Self {
            threshold: m.threshold,
            cooldown: chrono::Duration::minutes(cooldown_minutes as i64),
            horizon: chrono::Duration::hours(horizon_hours as i64),
            min_samples: m.min_samples_for_median,
            detailed_history_cap: m.detailed_history_cap,
            poll_interval: Duration::from_secs(poll_minutes * 60),
            fetch_budget: Duration::from_secs(config.feed.fetch_budget_secs),
            export_interval: chrono::Duration::minutes(export_minutes as i64),
        }
    }
}

/// Outcome of one cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub phase: LoopPhase,
    /// Observations returned by the source
    pub fetched: usize,
    /// Observations appended to windows
    pub accepted: usize,
    /// Observations dropped as malformed
    pub rejected: usize,
    /// Spikes classified, gated or not
    pub spikes: usize,
    pub alerts_sent: usize,
    pub alerts_failed: usize,
    /// Spikes held back by cooldown
    pub alerts_suppressed: usize,
    /// Whether the state save succeeded
    pub persisted: bool,
}

impl CycleReport {
    fn new(phase: LoopPhase) -> Self {
        Self {
            phase,
            fetched: 0,
            accepted: 0,
            rejected: 0,
            spikes: 0,
            alerts_sent: 0,
            alerts_failed: 0,
            alerts_suppressed: 0,
            persisted: false,
        }
    }
}
