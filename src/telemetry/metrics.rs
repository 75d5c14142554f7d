//! Prometheus metrics

use std::time::Duration;

/// Monotonic counters
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Completed polling cycles
    Cycles,
    /// Observations appended to windows
    Observations,
    /// Observations rejected as malformed
    RejectedObservations,
    /// Spikes classified (before gating)
    Spikes,
    /// Alerts delivered
    AlertsSent,
    /// Alerts that failed delivery
    AlertsFailed,
    /// Spikes held back by cooldown
    AlertsSuppressed,
    /// Ticker fetches that failed or timed out
    FetchFailures,
    /// State saves that failed
    PersistenceFailures,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Instruments with a window
    TrackedInstruments,
    /// Instruments currently in cooldown
    CoolingInstruments,
}

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Ticker fetch latency
    Fetch,
    /// Whole cycle latency
    Cycle,
}

fn counter_name(metric: CounterMetric) -> &'static str {
    match metric {
        CounterMetric::Cycles => "volspike_cycles_total",
        CounterMetric::Observations => "volspike_observations_total",
        CounterMetric::RejectedObservations => "volspike_observations_rejected_total",
        CounterMetric::Spikes => "volspike_spikes_total",
        CounterMetric::AlertsSent => "volspike_alerts_sent_total",
        CounterMetric::AlertsFailed => "volspike_alerts_failed_total",
        CounterMetric::AlertsSuppressed => "volspike_alerts_suppressed_total",
        CounterMetric::FetchFailures => "volspike_fetch_failures_total",
        CounterMetric::PersistenceFailures => "volspike_persistence_failures_total",
    }
}

/// Increment a counter
pub fn increment_counter(metric: CounterMetric, value: u64) {
    if value > 0 {
        metrics::counter!(counter_name(metric)).increment(value);
    }
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let metric_name = match metric {
        GaugeMetric::TrackedInstruments => "volspike_tracked_instruments",
        GaugeMetric::CoolingInstruments => "volspike_cooling_instruments",
    };

    metrics::gauge!(metric_name).set(value);
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let metric_name = match metric {
        LatencyMetric::Fetch => "volspike_fetch_latency_ms",
        LatencyMetric::Cycle => "volspike_cycle_latency_ms",
    };

    metrics::histogram!(metric_name).record(duration.as_secs_f64() * 1000.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter_is_noop() {
        increment_counter(CounterMetric::Cycles, 1);
        increment_counter(CounterMetric::Spikes, 0);
        set_gauge(GaugeMetric::TrackedInstruments, 42.0);
        record_latency(LatencyMetric::Cycle, Duration::from_millis(15));
    }

    #[test]
    fn test_counter_names_are_prefixed() {
        for metric in [
            CounterMetric::Cycles,
            CounterMetric::AlertsSent,
            CounterMetric::PersistenceFailures,
        ] {
            assert!(counter_name(metric).starts_with("volspike_"));
            assert!(counter_name(metric).ends_with("_total"));
        }
    }
}
