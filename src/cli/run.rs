//! Run command implementation

use crate::config::Config;
use crate::data::SnapshotExporter;
use crate::feed::{BybitClient, BybitConfig};
use crate::monitor::{MonitorLoop, MonitorSettings};
use crate::notify::{DiscordNotifier, LogNotifier, Notifier};
use crate::store::JsonFileStore;
use chrono::Utc;
use clap::Args;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Discord webhook URL (overrides config and DISCORD_WEBHOOK)
    #[arg(long)]
    pub webhook: Option<String>,

    /// Spike threshold multiplier (overrides config and SPIKE_THRESHOLD)
    #[arg(long)]
    pub threshold: Option<Decimal>,

    /// State file path
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,
}

impl RunArgs {
    /// Fold command-line overrides into the loaded configuration
    pub fn apply(&self, config: &mut Config) -> anyhow::Result<()> {
        if let Some(webhook) = &self.webhook {
            config.notify.discord_webhook = Some(webhook.clone());
        }
        if let Some(threshold) = self.threshold {
            config.monitor.threshold = threshold;
        }
        if let Some(state) = &self.state {
            config.storage.state_path = state.clone();
        }
        config.validate()
    }

    pub async fn execute(&self, mut config: Config) -> anyhow::Result<()> {
        self.apply(&mut config)?;

        match config.notify.discord_webhook.clone() {
            Some(url) => {
                let timeout = Duration::from_secs(config.notify.request_timeout_secs);
                let notifier = DiscordNotifier::new(url, timeout)?;
                tracing::info!("Alerts go to Discord");
                self.drive(&config, notifier).await
            }
            None => {
                tracing::warn!("No Discord webhook configured, alerts will only be logged");
                self.drive(&config, LogNotifier).await
            }
        }
    }

    async fn drive<N: Notifier>(&self, config: &Config, notifier: N) -> anyhow::Result<()> {
        let settings = MonitorSettings::from(config);
        let source = BybitClient::with_config(BybitConfig::from(&config.feed))?;
        let store = JsonFileStore::new(&config.storage.state_path);

        let mut monitor = MonitorLoop::restore(settings, source, notifier, store, Utc::now()).await?;
        if config.export.enabled {
            monitor = monitor.with_exporter(SnapshotExporter::new(
                &config.export.output_dir,
                config.export.format,
            ));
        }

        if self.once {
            monitor.run_cycle(Utc::now()).await;
            return Ok(());
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Shutdown signal received, finishing current cycle"),
                Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
            }
            let _ = shutdown_tx.send(true);
        });

        monitor.run(shutdown_rx).await;
        Ok(())
    }
}
