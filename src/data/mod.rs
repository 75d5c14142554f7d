//! Data export module
//!
//! Writes observation snapshots and detailed histories for offline analysis

mod export;

pub use export::{observation_batch, observation_schema, ExportFormat, SnapshotExporter};
