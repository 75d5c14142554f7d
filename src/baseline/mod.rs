//! Baseline estimation module
//!
//! Outlier-resistant reference volume per instrument

mod estimator;

pub use estimator::{median, BaselineEstimator};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a baseline was derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineMethod {
    /// Too few samples, latest value used
    ColdStart,
    /// Median of the window
    Median,
}

/// Reference volume for one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub instrument_id: String,
    pub value: Decimal,
    pub computed_at: DateTime<Utc>,
    /// Window size the value was computed from
    pub sample_count: usize,
    pub method: BaselineMethod,
}
