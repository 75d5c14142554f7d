//! Alert notification module
//!
//! Outbound delivery of spike alerts (Discord webhook or log only)

mod discord;
mod log_only;

pub use discord::{format_compact, DiscordNotifier};
pub use log_only::LogNotifier;

use crate::signal::SpikeSeverity;
use crate::window::MarketContext;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A spike that passed the alert gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpikeAlert {
    pub id: Uuid,
    pub instrument_id: String,
    pub current_value: Decimal,
    pub baseline_value: Decimal,
    pub multiplier: Decimal,
    pub severity: SpikeSeverity,
    pub context: MarketContext,
    pub detected_at: DateTime<Utc>,
}

/// Delivery failures; the alert is not recorded and stays eligible
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Transport-level failure
    #[error("notification request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Endpoint did not acknowledge
    #[error("notification rejected with {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
    /// Any other delivery failure
    #[error("notification failed: {0}")]
    Other(String),
}

/// Outbound alert channel; `Ok` is the delivery acknowledgment
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one alert
    async fn notify(&self, alert: &SpikeAlert) -> Result<(), NotifyError>;
}
