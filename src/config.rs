//! Configuration types for vol-spike

use crate::data::ExportFormat;
use crate::feed::BYBIT_API_URL;
use crate::telemetry::LogFormat;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::PathBuf;

/// Longest accepted alert cooldown (one week)
pub const MAX_COOLDOWN_MINUTES: u64 = 7 * 24 * 60;
/// Longest accepted baseline horizon (30 days)
pub const MAX_HORIZON_HOURS: u64 = 30 * 24;
/// Longest accepted poll interval (one day)
pub const MAX_POLL_INTERVAL_MINUTES: u64 = 24 * 60;
/// Longest accepted export interval (one week)
pub const MAX_EXPORT_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Spike detection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Multiple of baseline that counts as a spike
    #[serde(default = "default_threshold")]
    pub threshold: Decimal,

    /// Minimum minutes between alerts for one instrument
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: u64,

    /// Rolling window length in hours
    #[serde(default = "default_horizon_hours")]
    pub horizon_hours: u64,

    /// Minutes between polling cycles
    #[serde(default = "default_poll_interval_minutes")]
    pub poll_interval_minutes: u64,

    /// Samples required before the median replaces the latest value
    #[serde(default = "default_min_samples")]
    pub min_samples_for_median: usize,

    /// Samples kept per instrument for inspection and export
    #[serde(default = "default_detailed_history_cap")]
    pub detailed_history_cap: usize,
}

fn default_threshold() -> Decimal {
    Decimal::new(30, 1) // 3.0x
}
fn default_cooldown_minutes() -> u64 {
    30
}
fn default_horizon_hours() -> u64 {
    24
}
fn default_poll_interval_minutes() -> u64 {
    5
}
fn default_min_samples() -> usize {
    3
}
fn default_detailed_history_cap() -> usize {
    100
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            cooldown_minutes: default_cooldown_minutes(),
            horizon_hours: default_horizon_hours(),
            poll_interval_minutes: default_poll_interval_minutes(),
            min_samples_for_median: default_min_samples(),
            detailed_history_cap: default_detailed_history_cap(),
        }
    }
}

/// Ticker feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_category")]
    pub category: String,

    /// Only symbols with this suffix are monitored
    #[serde(default = "default_quote_suffix")]
    pub quote_suffix: String,

    /// Timeout for a single HTTP request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upper bound for a whole fetch including retries
    #[serde(default = "default_fetch_budget_secs")]
    pub fetch_budget_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    BYBIT_API_URL.to_string()
}
fn default_category() -> String {
    "linear".to_string()
}
fn default_quote_suffix() -> String {
    "USDT".to_string()
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_fetch_budget_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    2
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            category: default_category(),
            quote_suffix: default_quote_suffix(),
            request_timeout_secs: default_request_timeout_secs(),
            fetch_budget_secs: default_fetch_budget_secs(),
            max_retries: default_max_retries(),
        }
    }
}

/// Notification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Discord webhook; alerts are only logged when unset
    #[serde(default)]
    pub discord_webhook: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            discord_webhook: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// State persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
}

fn default_state_path() -> PathBuf {
    PathBuf::from("monitor_state.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
        }
    }
}

/// Periodic export configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_export_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_export_interval_minutes")]
    pub interval_minutes: u64,

    #[serde(default)]
    pub format: ExportFormat,
}

fn default_true() -> bool {
    true
}
fn default_export_dir() -> PathBuf {
    PathBuf::from("./exports")
}
fn default_export_interval_minutes() -> u64 {
    60
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_dir: default_export_dir(),
            interval_minutes: default_export_interval_minutes(),
            format: ExportFormat::Csv,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Prometheus listener port; no exporter when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `DISCORD_WEBHOOK` and `SPIKE_THRESHOLD` from the environment
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        self.apply_overrides(
            std::env::var("DISCORD_WEBHOOK").ok(),
            std::env::var("SPIKE_THRESHOLD").ok(),
        )
    }

    fn apply_overrides(
        &mut self,
        webhook: Option<String>,
        threshold: Option<String>,
    ) -> anyhow::Result<()> {
        if let Some(webhook) = webhook.filter(|w| !w.trim().is_empty()) {
            self.notify.discord_webhook = Some(webhook);
        }
        if let Some(raw) = threshold {
            self.monitor.threshold = raw
                .trim()
                .parse::<Decimal>()
                .map_err(|e| anyhow::anyhow!("Invalid SPIKE_THRESHOLD {:?}: {}", raw, e))?;
        }
        Ok(())
    }

    /// Reject values the monitor cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        let m = &self.monitor;
        if m.threshold <= Decimal::ZERO {
            anyhow::bail!("monitor.threshold must be positive, got {}", m.threshold);
        }
        if m.cooldown_minutes > MAX_COOLDOWN_MINUTES {
            anyhow::bail!(
                "monitor.cooldown_minutes must be at most {}, got {}",
                MAX_COOLDOWN_MINUTES,
                m.cooldown_minutes
            );
        }
        if !(1..=MAX_HORIZON_HOURS).contains(&m.horizon_hours) {
            anyhow::bail!(
                "monitor.horizon_hours must be between 1 and {}, got {}",
                MAX_HORIZON_HOURS,
                m.horizon_hours
            );
        }
        if !(1..=MAX_POLL_INTERVAL_MINUTES).contains(&m.poll_interval_minutes) {
            anyhow::bail!(
                "monitor.poll_interval_minutes must be between 1 and {}, got {}",
                MAX_POLL_INTERVAL_MINUTES,
                m.poll_interval_minutes
            );
        }
        if m.min_samples_for_median == 0 {
            anyhow::bail!("monitor.min_samples_for_median must be at least 1");
        }
        if m.detailed_history_cap == 0 {
            anyhow::bail!("monitor.detailed_history_cap must be at least 1");
        }
        if self.feed.request_timeout_secs == 0 || self.feed.fetch_budget_secs == 0 {
            anyhow::bail!("feed timeouts must be at least 1 second");
        }
        if self.export.enabled
            && !(1..=MAX_EXPORT_INTERVAL_MINUTES).contains(&self.export.interval_minutes)
        {
            anyhow::bail!(
                "export.interval_minutes must be between 1 and {} when export is enabled",
                MAX_EXPORT_INTERVAL_MINUTES
            );
        }
        Ok(())
    }
}
