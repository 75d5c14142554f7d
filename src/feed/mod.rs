//! Ticker feed module
//!
//! Pulls per-instrument volume observations from the exchange

mod bybit;
mod types;

pub use bybit::{BybitClient, BybitConfig, BYBIT_API_URL};
pub use types::FetchError;

use crate::window::Observation;
use async_trait::async_trait;

/// Source of observation batches
///
/// Implementations fail soft: a transient failure yields an empty batch and
/// is logged, never propagated into the monitor.
#[async_trait]
pub trait ObservationSource: Send + Sync {
    /// Fetch the current batch for all tracked instruments
    async fn fetch_observations(&self) -> Vec<Observation>;
}
