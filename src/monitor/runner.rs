//! Polling loop

use super::{CycleReport, LoopPhase, MonitorSettings};
use crate::alert::AlertGate;
use crate::baseline::BaselineEstimator;
use crate::data::SnapshotExporter;
use crate::feed::ObservationSource;
use crate::notify::{Notifier, SpikeAlert};
use crate::signal::SpikeDetector;
use crate::store::{PersistenceError, StateSnapshot, StateStore};
use crate::telemetry::{
    increment_counter, record_latency, set_gauge, CounterMetric, GaugeMetric, LatencyMetric,
};
use crate::window::{Observation, WindowStore};
use chrono::{DateTime, Utc};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const EXPORT_PREFIX: &str = "volumes";

/// Owns the monitor state and drives one cycle per poll tick
pub struct MonitorLoop<S, N, P> {
    settings: MonitorSettings,
    source: S,
    notifier: N,
    store: P,
    windows: WindowStore,
    estimator: BaselineEstimator,
    detector: SpikeDetector,
    gate: AlertGate,
    phase: LoopPhase,
    exporter: Option<SnapshotExporter>,
    next_export_at: DateTime<Utc>,
    consecutive_save_failures: u32,
}

impl<S, N, P> MonitorLoop<S, N, P>
where
    S: ObservationSource,
    N: Notifier,
    P: StateStore,
{
    /// Create a loop with empty state
    pub fn new(settings: MonitorSettings, source: S, notifier: N, store: P, now: DateTime<Utc>) -> Self {
        let windows = WindowStore::new(settings.horizon, settings.detailed_history_cap);
        let gate = AlertGate::new(settings.cooldown);
        Self::assemble(settings, source, notifier, store, windows, gate, now)
    }

    /// Create a loop from the store's saved state
    ///
    /// A load failure is fatal: the loop cannot run against unknown baselines
    /// and cooldowns. A missing state file is not a failure.
    pub async fn restore(
        settings: MonitorSettings,
        source: S,
        notifier: N,
        store: P,
        now: DateTime<Utc>,
    ) -> Result<Self, PersistenceError> {
        let snapshot = store.load_state().await?;
        let windows = WindowStore::from_snapshot(
            snapshot.windows,
            settings.horizon,
            settings.detailed_history_cap,
            now,
        );
        let gate = AlertGate::from_snapshot(snapshot.alerts, settings.cooldown);

        let monitor = Self::assemble(settings, source, notifier, store, windows, gate, now);
        info!(
            instruments = monitor.windows.len(),
            baselines = monitor.estimator.baselines().count(),
            cooling = monitor.cooling_count(now),
            "Monitor state restored"
        );
        Ok(monitor)
    }

    fn assemble(
        settings: MonitorSettings,
        source: S,
        notifier: N,
        store: P,
        windows: WindowStore,
        gate: AlertGate,
        now: DateTime<Utc>,
    ) -> Self {
        let mut estimator = BaselineEstimator::new(settings.min_samples);
        estimator.rebuild(&windows, now);

        Self {
            detector: SpikeDetector::new(settings.threshold),
            next_export_at: now + settings.export_interval,
            settings,
            source,
            notifier,
            store,
            windows,
            estimator,
            gate,
            phase: LoopPhase::Priming,
            exporter: None,
            consecutive_save_failures: 0,
        }
    }

    /// Export each accepted batch once per export interval
    pub fn with_exporter(mut self, exporter: SnapshotExporter) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub fn windows(&self) -> &WindowStore {
        &self.windows
    }

    pub fn estimator(&self) -> &BaselineEstimator {
        &self.estimator
    }

    pub fn gate(&self) -> &AlertGate {
        &self.gate
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    /// Run one full cycle at `now`
    ///
    /// Never fails: fetch, notify and save errors are logged, counted and
    /// reported, and the next cycle proceeds normally.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        let started = Instant::now();
        let mut report = CycleReport::new(self.phase);

        for id in self.windows.evict_expired(now) {
            self.estimator.forget(&id);
        }

        let batch = self.fetch().await;
        report.fetched = batch.len();

        let accepted = self.ingest(batch, now, &mut report);

        match self.phase {
            LoopPhase::Priming => {
                if accepted.is_empty() {
                    debug!("Empty batch while priming, staying in priming");
                } else {
                    info!(instruments = accepted.len(), "Baselines primed, spike detection active");
                    self.phase = LoopPhase::Polling;
                }
            }
            LoopPhase::Polling => {
                for observation in &accepted {
                    self.evaluate(observation, now, &mut report).await;
                }
            }
        }

        report.persisted = self.persist(now).await;
        self.maybe_export(&accepted, now).await;

        increment_counter(CounterMetric::Cycles, 1);
        increment_counter(CounterMetric::Observations, report.accepted as u64);
        increment_counter(CounterMetric::RejectedObservations, report.rejected as u64);
        increment_counter(CounterMetric::Spikes, report.spikes as u64);
        increment_counter(CounterMetric::AlertsSent, report.alerts_sent as u64);
        increment_counter(CounterMetric::AlertsFailed, report.alerts_failed as u64);
        increment_counter(CounterMetric::AlertsSuppressed, report.alerts_suppressed as u64);
        set_gauge(GaugeMetric::TrackedInstruments, self.windows.len() as f64);
        set_gauge(GaugeMetric::CoolingInstruments, self.cooling_count(now) as f64);
        record_latency(LatencyMetric::Cycle, started.elapsed());

        info!(
            phase = ?report.phase,
            fetched = report.fetched,
            accepted = report.accepted,
            rejected = report.rejected,
            spikes = report.spikes,
            sent = report.alerts_sent,
            failed = report.alerts_failed,
            suppressed = report.alerts_suppressed,
            persisted = report.persisted,
            "Cycle complete"
        );

        report
    }

    /// Cycle until `shutdown` flips to true or its sender is dropped
    ///
    /// The signal is only observed between cycles, so the cycle in flight
    /// always reaches its save.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            threshold = %self.settings.threshold,
            cooldown_minutes = self.settings.cooldown.num_minutes(),
            horizon_hours = self.settings.horizon.num_hours(),
            poll_interval_secs = self.settings.poll_interval.as_secs(),
            "Monitor started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.run_cycle(Utc::now()).await;

            tokio::select! {
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Monitor stopped");
    }

    async fn fetch(&self) -> Vec<Observation> {
        let started = Instant::now();
        let batch = match tokio::time::timeout(
            self.settings.fetch_budget,
            self.source.fetch_observations(),
        )
        .await
        {
            Ok(batch) => batch,
            Err(_) => {
                warn!(
                    budget_secs = self.settings.fetch_budget.as_secs_f64(),
                    "Observation fetch timed out, treating cycle as empty"
                );
                increment_counter(CounterMetric::FetchFailures, 1);
                Vec::new()
            }
        };
        record_latency(LatencyMetric::Fetch, started.elapsed());
        batch
    }

    /// Append each observation and refresh its baseline
    fn ingest(
        &mut self,
        batch: Vec<Observation>,
        now: DateTime<Utc>,
        report: &mut CycleReport,
    ) -> Vec<Observation> {
        let mut accepted = Vec::with_capacity(batch.len());

        for observation in batch {
            if let Err(e) = self.windows.append(observation.clone(), now) {
                warn!(error = %e, "Dropping invalid observation");
                report.rejected += 1;
                continue;
            }

            if let Some(window) = self.windows.window(&observation.instrument_id) {
                self.estimator
                    .baseline_for(&observation.instrument_id, window, now);
            }
            accepted.push(observation);
        }

        report.accepted = accepted.len();
        accepted
    }

    async fn evaluate(&mut self, observation: &Observation, now: DateTime<Utc>, report: &mut CycleReport) {
        let id = observation.instrument_id.as_str();
        let baseline = self
            .estimator
            .current(id)
            .map(|b| b.value)
            .unwrap_or(observation.volume);

        let result = self.detector.classify(observation.volume, baseline);
        if !result.is_spike {
            return;
        }
        report.spikes += 1;

        if !self.gate.should_alert(id, now) {
            debug!(
                instrument = id,
                multiplier = %result.multiplier.round_dp(2),
                remaining_secs = self
                    .gate
                    .cooldown_remaining(id, now)
                    .map(|d| d.num_seconds())
                    .unwrap_or_default(),
                "Spike suppressed by cooldown"
            );
            report.alerts_suppressed += 1;
            return;
        }

        let alert = SpikeAlert {
            id: Uuid::new_v4(),
            instrument_id: observation.instrument_id.clone(),
            current_value: observation.volume,
            baseline_value: baseline,
            multiplier: result.multiplier,
            severity: result.severity(),
            context: observation.context.clone(),
            detected_at: now,
        };

        match self.notifier.notify(&alert).await {
            Ok(()) => {
                self.gate
                    .record_alert(alert.id, observation, baseline, &result, now);
                info!(
                    instrument = id,
                    alert_id = %alert.id,
                    multiplier = %result.multiplier.round_dp(2),
                    volume = %observation.volume.round_dp(2),
                    baseline = %baseline.round_dp(2),
                    "Spike alert sent"
                );
                report.alerts_sent += 1;
            }
            Err(e) => {
                warn!(
                    instrument = id,
                    error = %e,
                    "Spike alert delivery failed, instrument stays eligible"
                );
                report.alerts_failed += 1;
            }
        }
    }

    async fn persist(&mut self, now: DateTime<Utc>) -> bool {
        let snapshot = StateSnapshot::new(self.windows.snapshot(), self.gate.snapshot(), now);
        match self.store.save_state(&snapshot).await {
            Ok(()) => {
                self.consecutive_save_failures = 0;
                true
            }
            Err(e) => {
                self.consecutive_save_failures += 1;
                error!(
                    error = %e,
                    consecutive_failures = self.consecutive_save_failures,
                    "Failed to save monitor state, keeping in-memory state"
                );
                increment_counter(CounterMetric::PersistenceFailures, 1);
                false
            }
        }
    }

    /// File writes run on the blocking pool; the cycle waits for them
    async fn maybe_export(&mut self, accepted: &[Observation], now: DateTime<Utc>) {
        let Some(exporter) = self.exporter.clone() else {
            return;
        };
        if accepted.is_empty() || now < self.next_export_at {
            return;
        }

        let batch = accepted.to_vec();
        let written =
            tokio::task::spawn_blocking(move || exporter.export(EXPORT_PREFIX, &batch, now)).await;
        match written {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!(error = %e, "Periodic export failed"),
            Err(e) => warn!(error = %e, "Periodic export task did not complete"),
        }
        self.next_export_at = now + self.settings.export_interval;
    }

    fn cooling_count(&self, now: DateTime<Utc>) -> usize {
        self.gate
            .records()
            .filter(|r| !self.gate.should_alert(&r.instrument_id, now))
            .count()
    }
}
