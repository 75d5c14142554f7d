//! Alert gating module
//!
//! Rate-limits spike alerts per instrument

mod gate;

pub use gate::AlertGate;

use crate::window::Observation;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// The most recent alert sent for an instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub instrument_id: String,
    /// Identifier of the dispatched alert
    pub alert_id: Uuid,
    pub last_alert_at: DateTime<Utc>,
    pub multiplier: Decimal,
    /// Baseline the spike was measured against
    pub baseline: Decimal,
    /// Sample that triggered the alert
    pub observation: Observation,
}

/// Serializable form of an [`AlertGate`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertGateSnapshot {
    pub records: BTreeMap<String, AlertRecord>,
}
