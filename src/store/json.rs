//! JSON file state store

use super::{PersistenceError, StateSnapshot, StateStore, STATE_VERSION};
use async_trait::async_trait;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Only the version, so an incompatible file is reported as such rather than as a parse error
#[derive(Deserialize)]
struct VersionHeader {
    version: u32,
}

/// Stores state as one pretty-printed JSON document
///
/// Writes go to a sibling `.tmp` file which is then renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_err(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load_state(&self) -> Result<StateSnapshot, PersistenceError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = ?self.path, "No saved state, starting fresh");
                return Ok(StateSnapshot::empty());
            }
            Err(e) => return Err(self.io_err(e)),
        };

        let header: VersionHeader = serde_json::from_str(&content)?;
        if header.version != STATE_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                found: header.version,
                expected: STATE_VERSION,
            });
        }

        let snapshot: StateSnapshot = serde_json::from_str(&content)?;
        tracing::info!(
            path = ?self.path,
            instruments = snapshot.windows.instruments.len(),
            alerts = snapshot.alerts.records.len(),
            saved_at = %snapshot.saved_at,
            "Loaded saved state"
        );
        Ok(snapshot)
    }

    async fn save_state(&self, snapshot: &StateSnapshot) -> Result<(), PersistenceError> {
        let content = serde_json::to_vec_pretty(snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_err(e))?;
        }

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, &content)
            .await
            .map_err(|e| self.io_err(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_err(e))?;

        tracing::debug!(path = ?self.path, bytes = content.len(), "Saved state");
        Ok(())
    }
}
