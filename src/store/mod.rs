//! State persistence module
//!
//! Snapshots of window and alert state, saved after every cycle and loaded at
//! startup so a restart reproduces the same baselines and cooldowns.

mod json;
mod memory;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

use crate::alert::AlertGateSnapshot;
use crate::window::WindowStoreSnapshot;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Current snapshot schema version
pub const STATE_VERSION: u32 = 1;

/// Everything the monitor needs to resume after a restart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub windows: WindowStoreSnapshot,
    #[serde(default)]
    pub alerts: AlertGateSnapshot,
}

impl StateSnapshot {
    /// Snapshot at the current schema version
    pub fn new(
        windows: WindowStoreSnapshot,
        alerts: AlertGateSnapshot,
        saved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            version: STATE_VERSION,
            saved_at,
            windows,
            alerts,
        }
    }

    /// Empty state for a first run
    pub fn empty() -> Self {
        Self::new(
            WindowStoreSnapshot::default(),
            AlertGateSnapshot::default(),
            Utc::now(),
        )
    }

    /// Whether no instrument state is present
    pub fn is_empty(&self) -> bool {
        self.windows.instruments.is_empty() && self.alerts.records.is_empty()
    }
}

/// Persistence failures
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Filesystem failure
    #[error("state I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Snapshot could not be (de)serialized
    #[error("state serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
    /// Snapshot written by an incompatible schema
    #[error("unsupported state version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

/// Load/save of monitor state
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the last saved state; a store with nothing saved yields an empty snapshot
    async fn load_state(&self) -> Result<StateSnapshot, PersistenceError>;
    /// Overwrite the saved state
    async fn save_state(&self, snapshot: &StateSnapshot) -> Result<(), PersistenceError>;
}
