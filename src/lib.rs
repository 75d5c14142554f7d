//! vol-spike: volume spike monitor for exchange perpetuals
//!
//! This library provides the core components for:
//! - Per-instrument sliding windows of volume observations
//! - Robust median baselines with a cold-start fallback
//! - Spike classification against a configurable multiplier
//! - Per-instrument alert cooldowns that survive restarts
//! - Ticker polling from Bybit and alert delivery to Discord
//! - State persistence and CSV/Parquet export
//! - Logging and Prometheus metrics

pub mod alert;
pub mod baseline;
pub mod cli;
pub mod config;
pub mod data;
pub mod feed;
pub mod monitor;
pub mod notify;
pub mod signal;
pub mod store;
pub mod telemetry;
pub mod window;
