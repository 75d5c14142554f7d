//! Per-instrument rolling windows

use super::{InvalidObservation, Observation};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Time-ordered samples for one instrument, all newer than the horizon cutoff
#[derive(Debug, Clone, Default)]
pub struct Window {
    samples: VecDeque<Observation>,
}

impl Window {
    /// Insert keeping `observed_at` ascending, then drop everything at or before `cutoff`
    fn insert_and_evict(&mut self, observation: Observation, cutoff: DateTime<Utc>) {
        let pos = self
            .samples
            .iter()
            .rposition(|s| s.observed_at <= observation.observed_at)
            .map_or(0, |i| i + 1);
        self.samples.insert(pos, observation);
        self.evict(cutoff);
    }

    fn evict(&mut self, cutoff: DateTime<Utc>) {
        while let Some(front) = self.samples.front() {
            if front.observed_at <= cutoff {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Number of samples in the window
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the window holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recent sample by `observed_at`
    pub fn latest(&self) -> Option<&Observation> {
        self.samples.back()
    }

    /// Samples oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.samples.iter()
    }
}

/// Serializable form of a [`WindowStore`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowStoreSnapshot {
    pub instruments: BTreeMap<String, InstrumentSnapshot>,
}

/// Window and detailed history for one instrument
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSnapshot {
    pub window: Vec<Observation>,
    #[serde(default)]
    pub detailed: Vec<Observation>,
}

/// Append-only store of per-instrument windows
///
/// Each append evicts samples older than the horizon. A separate detailed
/// history keeps the most recent `detailed_cap` samples regardless of age,
/// for inspection and export only.
#[derive(Debug, Clone)]
pub struct WindowStore {
    horizon: Duration,
    detailed_cap: usize,
    windows: HashMap<String, Window>,
    detailed: HashMap<String, VecDeque<Observation>>,
}

impl WindowStore {
    /// Create an empty store
    pub fn new(horizon: Duration, detailed_cap: usize) -> Self {
        Self {
            horizon,
            detailed_cap,
            windows: HashMap::new(),
            detailed: HashMap::new(),
        }
    }

    /// Window horizon
    pub fn horizon(&self) -> Duration {
        self.horizon
    }

    /// Append a sample and evict everything at or before `now - horizon`
    pub fn append(
        &mut self,
        observation: Observation,
        now: DateTime<Utc>,
    ) -> Result<(), InvalidObservation> {
        observation.validate()?;

        let cutoff = now - self.horizon;
        let history = self
            .detailed
            .entry(observation.instrument_id.clone())
            .or_default();
        history.push_back(observation.clone());
        while history.len() > self.detailed_cap {
            history.pop_front();
        }

        self.windows
            .entry(observation.instrument_id.clone())
            .or_default()
            .insert_and_evict(observation, cutoff);

        Ok(())
    }

    /// Age-evict every instrument's window
    ///
    /// An instrument whose window ends up empty has had no sample within the
    /// horizon, so its detailed history is stale too; both are dropped and its
    /// id is returned.
    pub fn evict_expired(&mut self, now: DateTime<Utc>) -> Vec<String> {
        let cutoff = now - self.horizon;
        for window in self.windows.values_mut() {
            window.evict(cutoff);
        }

        let mut dropped: Vec<String> = self
            .windows
            .iter()
            .filter(|(_, w)| w.is_empty())
            .map(|(id, _)| id.clone())
            .collect();
        dropped.sort_unstable();

        for id in &dropped {
            self.windows.remove(id);
            self.detailed.remove(id);
            tracing::debug!(instrument = %id, "Dropping instrument with no samples inside the horizon");
        }
        dropped
    }

    /// Current window for an instrument
    pub fn window(&self, instrument_id: &str) -> Option<&Window> {
        self.windows.get(instrument_id)
    }

    /// Bounded detailed history for an instrument, oldest first
    pub fn detailed_history(&self, instrument_id: &str) -> Option<&VecDeque<Observation>> {
        self.detailed.get(instrument_id)
    }

    /// Instruments with a window, sorted
    pub fn instruments(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.windows.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of tracked instruments
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether no instrument is tracked
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Capture the store for persistence
    pub fn snapshot(&self) -> WindowStoreSnapshot {
        let mut instruments = BTreeMap::new();
        for (id, window) in &self.windows {
            let detailed = self
                .detailed
                .get(id)
                .map(|h| h.iter().cloned().collect())
                .unwrap_or_default();
            instruments.insert(
                id.clone(),
                InstrumentSnapshot {
                    window: window.iter().cloned().collect(),
                    detailed,
                },
            );
        }
        WindowStoreSnapshot { instruments }
    }

    /// Rebuild a store from a snapshot, dropping invalid and expired samples
    pub fn from_snapshot(
        snapshot: WindowStoreSnapshot,
        horizon: Duration,
        detailed_cap: usize,
        now: DateTime<Utc>,
    ) -> Self {
        let mut store = Self::new(horizon, detailed_cap);
        let cutoff = now - horizon;

        for (id, instrument) in snapshot.instruments {
            let mut window = Window::default();
            for observation in instrument.window {
                if observation.instrument_id != id {
                    tracing::warn!(
                        key = %id,
                        instrument = %observation.instrument_id,
                        "Skipping snapshot sample filed under the wrong instrument"
                    );
                    continue;
                }
                if let Err(e) = observation.validate() {
                    tracing::warn!(error = %e, "Skipping invalid snapshot sample");
                    continue;
                }
                window.insert_and_evict(observation, cutoff);
            }

            let mut detailed: VecDeque<Observation> = instrument.detailed.into();
            while detailed.len() > detailed_cap {
                detailed.pop_front();
            }

            store.detailed.insert(id.clone(), detailed);
            store.windows.insert(id, window);
        }

        store.evict_expired(now);
        store
    }
}
