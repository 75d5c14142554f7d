//! In-memory state store

use super::{PersistenceError, StateSnapshot, StateStore};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keeps the last saved snapshot in memory; clones share storage
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<Option<StateSnapshot>>>,
    saves: Arc<RwLock<u64>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a snapshot
    pub fn with_snapshot(snapshot: StateSnapshot) -> Self {
        Self {
            state: Arc::new(RwLock::new(Some(snapshot))),
            saves: Arc::new(RwLock::new(0)),
        }
    }

    /// Last saved snapshot
    pub async fn snapshot(&self) -> Option<StateSnapshot> {
        self.state.read().await.clone()
    }

    /// Number of successful saves
    pub async fn save_count(&self) -> u64 {
        *self.saves.read().await
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load_state(&self) -> Result<StateSnapshot, PersistenceError> {
        Ok(self
            .state
            .read()
            .await
            .clone()
            .unwrap_or_else(StateSnapshot::empty))
    }

    async fn save_state(&self, snapshot: &StateSnapshot) -> Result<(), PersistenceError> {
        *self.state.write().await = Some(snapshot.clone());
        *self.saves.write().await += 1;
        Ok(())
    }
}
