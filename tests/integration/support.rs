//! Scripted collaborators for driving full monitor cycles

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use vol_spike::feed::ObservationSource;
use vol_spike::notify::{Notifier, NotifyError, SpikeAlert};
use vol_spike::window::Observation;

/// Returns one queued batch per fetch, then empty batches
#[derive(Clone, Default)]
pub struct ScriptedSource {
    batches: Arc<Mutex<VecDeque<Vec<Observation>>>>,
}

impl ScriptedSource {
    pub fn push(&self, batch: Vec<Observation>) {
        self.batches.lock().unwrap().push_back(batch);
    }

    /// Queue a single-observation batch
    pub fn push_volume(&self, id: &str, volume: Decimal, at: DateTime<Utc>) {
        self.push(vec![Observation::new(id, volume, at)]);
    }
}

#[async_trait]
impl ObservationSource for ScriptedSource {
    async fn fetch_observations(&self) -> Vec<Observation> {
        self.batches.lock().unwrap().pop_front().unwrap_or_default()
    }
}

/// Records delivered alerts; can be switched into a failing mode
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SpikeAlert>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SpikeAlert> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, alert: &SpikeAlert) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Other("endpoint unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

/// Fixed epoch so cycle timestamps are reproducible
pub fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub fn minutes(m: i64) -> DateTime<Utc> {
    t0() + Duration::minutes(m)
}
