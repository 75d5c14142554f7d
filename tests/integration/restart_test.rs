//! Restart safety with the JSON state file

use crate::support::{minutes, RecordingNotifier, ScriptedSource};
use rust_decimal_macros::dec;
use tempfile::TempDir;
use vol_spike::monitor::{LoopPhase, MonitorLoop, MonitorSettings};
use vol_spike::store::{JsonFileStore, PersistenceError, StateStore};

#[tokio::test]
async fn test_restart_restores_baselines_and_cooldowns() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("monitor_state.json");
    let notifier = RecordingNotifier::default();

    let source = ScriptedSource::default();
    let mut first = MonitorLoop::restore(
        MonitorSettings::default(),
        source.clone(),
        notifier.clone(),
        JsonFileStore::new(&path),
        minutes(-30),
    )
    .await
    .unwrap();

    for i in 0..6 {
        let at = minutes(-30 + 5 * i);
        source.push_volume("BTCUSDT", dec!(100), at);
        first.run_cycle(at).await;
    }
    source.push_volume("BTCUSDT", dec!(400), minutes(0));
    assert_eq!(first.run_cycle(minutes(0)).await.alerts_sent, 1);
    let before = first.estimator().current("BTCUSDT").cloned().unwrap();
    drop(first);

    let source = ScriptedSource::default();
    let mut second = MonitorLoop::restore(
        MonitorSettings::default(),
        source.clone(),
        notifier.clone(),
        JsonFileStore::new(&path),
        minutes(0),
    )
    .await
    .unwrap();

    let after = second.estimator().current("BTCUSDT").unwrap();
    assert_eq!(after.value, before.value);
    assert_eq!(after.method, before.method);
    assert_eq!(after.sample_count, before.sample_count);
    assert!(!second.gate().should_alert("BTCUSDT", minutes(10)));
    assert_eq!(second.phase(), LoopPhase::Priming);

    source.push_volume("BTCUSDT", dec!(100), minutes(5));
    second.run_cycle(minutes(5)).await;

    source.push_volume("BTCUSDT", dec!(500), minutes(10));
    let report = second.run_cycle(minutes(10)).await;
    assert_eq!(report.spikes, 1);
    assert_eq!(report.alerts_suppressed, 1);

    source.push_volume("BTCUSDT", dec!(500), minutes(31));
    let report = second.run_cycle(minutes(31)).await;
    assert_eq!(report.alerts_sent, 1);
    assert_eq!(notifier.sent().len(), 2);
}

#[tokio::test]
async fn test_restore_drops_expired_samples() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("monitor_state.json");
    let source = ScriptedSource::default();

    let mut first = MonitorLoop::new(
        MonitorSettings::default(),
        source.clone(),
        RecordingNotifier::default(),
        JsonFileStore::new(&path),
        minutes(0),
    );
    for i in 0..3 {
        source.push_volume("BTCUSDT", dec!(100), minutes(5 * i));
        first.run_cycle(minutes(5 * i)).await;
    }
    drop(first);

    // Two days later every sample is past the horizon
    let second = MonitorLoop::restore(
        MonitorSettings::default(),
        ScriptedSource::default(),
        RecordingNotifier::default(),
        JsonFileStore::new(&path),
        minutes(48 * 60),
    )
    .await
    .unwrap();

    assert!(second.windows().window("BTCUSDT").is_none());
    assert!(second.windows().detailed_history("BTCUSDT").is_none());
    assert!(second.estimator().current("BTCUSDT").is_none());
    assert!(second.windows().is_empty());
}

#[tokio::test]
async fn test_corrupt_state_is_fatal_at_startup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("monitor_state.json");
    std::fs::write(&path, "{ definitely not state").unwrap();

    let result = MonitorLoop::restore(
        MonitorSettings::default(),
        ScriptedSource::default(),
        RecordingNotifier::default(),
        JsonFileStore::new(&path),
        minutes(0),
    )
    .await;

    assert!(matches!(result, Err(PersistenceError::Serde(_))));
}

#[tokio::test]
async fn test_state_file_is_versioned_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("monitor_state.json");
    let source = ScriptedSource::default();
    let store = JsonFileStore::new(&path);

    let mut monitor = MonitorLoop::new(
        MonitorSettings::default(),
        source.clone(),
        RecordingNotifier::default(),
        store.clone(),
        minutes(0),
    );
    source.push_volume("ETHUSDT", dec!(42), minutes(0));
    monitor.run_cycle(minutes(0)).await;

    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["version"], 1);
    assert!(raw["windows"]["instruments"]["ETHUSDT"].is_object());

    let loaded = store.load_state().await.unwrap();
    assert_eq!(loaded.windows.instruments["ETHUSDT"].window.len(), 1);
}
