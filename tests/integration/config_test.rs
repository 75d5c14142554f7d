//! Configuration loading

use rust_decimal_macros::dec;
use std::io::Write;
use tempfile::NamedTempFile;
use vol_spike::config::Config;
use vol_spike::monitor::MonitorSettings;

#[test]
fn test_load_partial_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [monitor]
        threshold = 4.0
        cooldown_minutes = 15

        [notify]
        discord_webhook = "https://discord.test/hook"
        "#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.monitor.threshold, dec!(4.0));
    assert_eq!(config.monitor.horizon_hours, 24);
    assert_eq!(config.feed.category, "linear");
    assert!(config.export.enabled);

    let settings = MonitorSettings::from(&config);
    assert_eq!(settings.cooldown, chrono::Duration::minutes(15));
    assert_eq!(settings.min_samples, 3);
}

#[test]
fn test_missing_file_is_error() {
    assert!(Config::load("/nonexistent/vol-spike.toml").is_err());
}

#[test]
fn test_bundled_example_matches_defaults() {
    let config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();
    let defaults = MonitorSettings::default();
    let loaded = MonitorSettings::from(&config);

    assert_eq!(loaded.threshold, defaults.threshold);
    assert_eq!(loaded.cooldown, defaults.cooldown);
    assert_eq!(loaded.horizon, defaults.horizon);
    assert_eq!(loaded.poll_interval, defaults.poll_interval);
    assert_eq!(loaded.detailed_history_cap, defaults.detailed_history_cap);
}
