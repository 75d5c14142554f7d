//! Per-instrument alert cooldown

use super::{AlertGateSnapshot, AlertRecord};
use crate::signal::SpikeResult;
use crate::window::Observation;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

/// Suppresses repeat alerts for an instrument until its cooldown has elapsed
///
/// Holds only the most recent alert per instrument.
#[derive(Debug, Clone)]
pub struct AlertGate {
    cooldown: Duration,
    records: HashMap<String, AlertRecord>,
}

impl AlertGate {
    /// Create a gate with no alert history
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            records: HashMap::new(),
        }
    }

    /// Restore a gate from persisted records
    pub fn from_snapshot(snapshot: AlertGateSnapshot, cooldown: Duration) -> Self {
        Self {
            cooldown,
            records: snapshot.records.into_iter().collect(),
        }
    }

    /// Cooldown between alerts for the same instrument
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Whether an alert may fire for the instrument at `now`
    ///
    /// The boundary is inclusive: eligible again exactly at `last_alert_at + cooldown`.
    pub fn should_alert(&self, instrument_id: &str, now: DateTime<Utc>) -> bool {
        match self.records.get(instrument_id) {
            None => true,
            Some(record) => now >= record.last_alert_at + self.cooldown,
        }
    }

    /// Time left before the instrument is eligible again
    pub fn cooldown_remaining(&self, instrument_id: &str, now: DateTime<Utc>) -> Option<Duration> {
        let record = self.records.get(instrument_id)?;
        let expires = record.last_alert_at + self.cooldown;
        (expires > now).then(|| expires - now)
    }

    /// Overwrite the instrument's record with a freshly dispatched alert
    pub fn record_alert(
        &mut self,
        alert_id: Uuid,
        observation: &Observation,
        baseline: Decimal,
        result: &SpikeResult,
        at: DateTime<Utc>,
    ) -> &AlertRecord {
        let record = AlertRecord {
            instrument_id: observation.instrument_id.clone(),
            alert_id,
            last_alert_at: at,
            multiplier: result.multiplier,
            baseline,
            observation: observation.clone(),
        };
        self.records.insert(observation.instrument_id.clone(), record);
        &self.records[&observation.instrument_id]
    }

    /// Most recent alert for an instrument
    pub fn record(&self, instrument_id: &str) -> Option<&AlertRecord> {
        self.records.get(instrument_id)
    }

    /// Every stored record
    pub fn records(&self) -> impl Iterator<Item = &AlertRecord> {
        self.records.values()
    }

    /// Capture the gate for persistence
    pub fn snapshot(&self) -> AlertGateSnapshot {
        AlertGateSnapshot {
            records: self
                .records
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}
