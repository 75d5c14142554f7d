//! Status command implementation

use crate::alert::AlertGate;
use crate::baseline::BaselineEstimator;
use crate::config::Config;
use crate::monitor::MonitorSettings;
use crate::store::{JsonFileStore, StateStore};
use crate::window::WindowStore;
use chrono::Utc;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// State file path
    #[arg(long)]
    pub state: Option<PathBuf>,
}

impl StatusArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let path = self
            .state
            .clone()
            .unwrap_or_else(|| config.storage.state_path.clone());
        let settings = MonitorSettings::from(&config);
        let now = Utc::now();

        let snapshot = JsonFileStore::new(&path).load_state().await?;
        let saved_at = snapshot.saved_at;
        let windows = WindowStore::from_snapshot(
            snapshot.windows,
            settings.horizon,
            settings.detailed_history_cap,
            now,
        );
        let gate = AlertGate::from_snapshot(snapshot.alerts, settings.cooldown);
        let mut estimator = BaselineEstimator::new(settings.min_samples);
        estimator.rebuild(&windows, now);

        println!("vol-spike status");
        println!("  State file: {}", path.display());
        println!("  Saved at: {}", saved_at.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("  Instruments: {}", windows.len());

        for id in windows.instruments() {
            let samples = windows.window(id).map(|w| w.len()).unwrap_or_default();
            let baseline = estimator
                .current(id)
                .map(|b| format!("{} ({:?})", b.value.round_dp(2), b.method))
                .unwrap_or_else(|| "-".to_string());
            let cooldown = gate
                .cooldown_remaining(id, now)
                .map(|d| format!("cooldown {}m", d.num_minutes() + 1))
                .unwrap_or_else(|| "eligible".to_string());
            println!("    {:<16} samples={:<4} baseline={} {}", id, samples, baseline, cooldown);
        }

        let last_alert = gate.records().max_by_key(|r| r.last_alert_at);
        if let Some(record) = last_alert {
            println!(
                "  Last alert: {} {}x at {}",
                record.instrument_id,
                record.multiplier.round_dp(2),
                record.last_alert_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }

        Ok(())
    }
}
