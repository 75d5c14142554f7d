//! Full monitor cycles against scripted collaborators

use crate::support::{minutes, RecordingNotifier, ScriptedSource};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use vol_spike::monitor::{LoopPhase, MonitorLoop, MonitorSettings};
use vol_spike::store::MemoryStore;
use vol_spike::window::Observation;

type TestLoop = MonitorLoop<ScriptedSource, RecordingNotifier, MemoryStore>;

fn monitor(source: &ScriptedSource, notifier: &RecordingNotifier, store: &MemoryStore) -> TestLoop {
    MonitorLoop::new(
        MonitorSettings::default(),
        source.clone(),
        notifier.clone(),
        store.clone(),
        minutes(-60),
    )
}

/// Prime and warm one instrument with flat volume, one cycle per entry
async fn warm_up(monitor: &mut TestLoop, source: &ScriptedSource, id: &str, volumes: &[Decimal], start: i64) {
    for (i, volume) in volumes.iter().enumerate() {
        let at = minutes(start + 5 * i as i64);
        source.push_volume(id, *volume, at);
        monitor.run_cycle(at).await;
    }
}

#[tokio::test]
async fn test_spike_over_flat_history() {
    let (source, notifier, store): (ScriptedSource, RecordingNotifier, MemoryStore) = Default::default();
    let mut monitor = monitor(&source, &notifier, &store);
    warm_up(&mut monitor, &source, "BTCUSDT", &[dec!(100); 5], -25).await;

    source.push_volume("BTCUSDT", dec!(350), minutes(0));
    let report = monitor.run_cycle(minutes(0)).await;

    assert_eq!(report.phase, LoopPhase::Polling);
    assert_eq!(report.alerts_sent, 1);
    let sent = notifier.sent();
    assert_eq!(sent[0].multiplier, dec!(3.5));
    assert_eq!(sent[0].baseline_value, dec!(100));
    assert_eq!(sent[0].current_value, dec!(350));
}

#[tokio::test]
async fn test_first_cycle_seeds_without_alerting() {
    let (source, notifier, store): (ScriptedSource, RecordingNotifier, MemoryStore) = Default::default();
    let mut monitor = monitor(&source, &notifier, &store);

    source.push_volume("BTCUSDT", dec!(500), minutes(0));
    let report = monitor.run_cycle(minutes(0)).await;

    assert_eq!(report.phase, LoopPhase::Priming);
    assert_eq!(report.spikes, 0);
    assert_eq!(monitor.estimator().current("BTCUSDT").unwrap().value, dec!(500));
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn test_zero_baseline_never_alerts() {
    let (source, notifier, store): (ScriptedSource, RecordingNotifier, MemoryStore) = Default::default();
    let mut monitor = monitor(&source, &notifier, &store);
    warm_up(&mut monitor, &source, "DEADUSDT", &[dec!(0); 3], -15).await;

    source.push_volume("DEADUSDT", dec!(1000000), minutes(0));
    let report = monitor.run_cycle(minutes(0)).await;

    assert_eq!(report.spikes, 0);
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn test_cooldown_between_alerts() {
    let (source, notifier, store): (ScriptedSource, RecordingNotifier, MemoryStore) = Default::default();
    let mut monitor = monitor(&source, &notifier, &store);
    warm_up(&mut monitor, &source, "BTCUSDT", &[dec!(100); 6], -30).await;

    source.push_volume("BTCUSDT", dec!(400), minutes(0));
    assert_eq!(monitor.run_cycle(minutes(0)).await.alerts_sent, 1);

    source.push_volume("BTCUSDT", dec!(500), minutes(10));
    let report = monitor.run_cycle(minutes(10)).await;
    assert_eq!(report.spikes, 1);
    assert_eq!(report.alerts_sent, 0);
    assert_eq!(report.alerts_suppressed, 1);

    source.push_volume("BTCUSDT", dec!(500), minutes(31));
    let report = monitor.run_cycle(minutes(31)).await;
    assert_eq!(report.alerts_sent, 1);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(monitor.gate().record("BTCUSDT").unwrap().alert_id, sent[1].id);
}

#[tokio::test]
async fn test_failed_dispatch_retried_next_cycle() {
    let (source, notifier, store): (ScriptedSource, RecordingNotifier, MemoryStore) = Default::default();
    let mut monitor = monitor(&source, &notifier, &store);
    warm_up(&mut monitor, &source, "BTCUSDT", &[dec!(100); 4], -20).await;

    notifier.set_failing(true);
    source.push_volume("BTCUSDT", dec!(400), minutes(0));
    let report = monitor.run_cycle(minutes(0)).await;
    assert_eq!(report.alerts_failed, 1);
    assert!(monitor.gate().record("BTCUSDT").is_none());

    notifier.set_failing(false);
    source.push_volume("BTCUSDT", dec!(400), minutes(5));
    let report = monitor.run_cycle(minutes(5)).await;
    assert_eq!(report.alerts_sent, 1);
    assert_eq!(monitor.gate().record("BTCUSDT").unwrap().last_alert_at, minutes(5));
}

#[tokio::test]
async fn test_instruments_processed_independently() {
    let (source, notifier, store): (ScriptedSource, RecordingNotifier, MemoryStore) = Default::default();
    let mut monitor = monitor(&source, &notifier, &store);

    for i in 0..4 {
        let at = minutes(-20 + 5 * i);
        source.push(vec![
            Observation::new("BTCUSDT", dec!(100), at),
            Observation::new("ETHUSDT", dec!(40), at),
        ]);
        monitor.run_cycle(at).await;
    }

    source.push(vec![
        Observation::new("BTCUSDT", dec!(-1), minutes(0)),
        Observation::new("ETHUSDT", dec!(200), minutes(0)),
        Observation::new("SOLUSDT", dec!(9000), minutes(0)),
    ]);
    let report = monitor.run_cycle(minutes(0)).await;

    assert_eq!(report.rejected, 1);
    assert_eq!(report.accepted, 2);
    assert_eq!(report.alerts_sent, 1);
    let sent = notifier.sent();
    assert_eq!(sent[0].instrument_id, "ETHUSDT");
    assert_eq!(sent[0].multiplier, dec!(5));
    assert_eq!(monitor.windows().len(), 3);
}

#[tokio::test]
async fn test_expired_samples_leave_baseline() {
    let (source, notifier, store): (ScriptedSource, RecordingNotifier, MemoryStore) = Default::default();
    let mut monitor = monitor(&source, &notifier, &store);

    // Three loud samples a day ago, then quiet ones
    warm_up(&mut monitor, &source, "BTCUSDT", &[dec!(1000); 3], -(24 * 60 + 30)).await;
    warm_up(&mut monitor, &source, "BTCUSDT", &[dec!(100); 3], -15).await;

    let baseline = monitor.estimator().current("BTCUSDT").unwrap();
    assert_eq!(baseline.value, dec!(100));
    assert_eq!(baseline.sample_count, 3);
}

#[tokio::test]
async fn test_state_saved_every_cycle() {
    let (source, notifier, store): (ScriptedSource, RecordingNotifier, MemoryStore) = Default::default();
    let mut monitor = monitor(&source, &notifier, &store);

    warm_up(&mut monitor, &source, "BTCUSDT", &[dec!(100); 4], -20).await;
    monitor.run_cycle(minutes(0)).await;

    assert_eq!(store.save_count().await, 5);
    let saved = store.snapshot().await.unwrap();
    assert_eq!(saved.saved_at, minutes(0));
    assert_eq!(saved.windows.instruments["BTCUSDT"].window.len(), 4);
}
