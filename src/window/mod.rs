//! Rolling volume windows
//!
//! Per-instrument, time-bounded sample buffers that feed the baseline estimator

mod store;
mod types;

pub use store::{InstrumentSnapshot, Window, WindowStore, WindowStoreSnapshot};
pub use types::{InvalidObservation, MarketContext, Observation};
