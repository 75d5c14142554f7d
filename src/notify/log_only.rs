//! Log-only notifier

use super::{Notifier, NotifyError, SpikeAlert};
use async_trait::async_trait;

/// Writes alerts to the log and always acknowledges
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, alert: &SpikeAlert) -> Result<(), NotifyError> {
        tracing::warn!(
            alert_id = %alert.id,
            instrument = %alert.instrument_id,
            multiplier = %alert.multiplier.round_dp(2),
            current = %alert.current_value.round_dp(2),
            baseline = %alert.baseline_value.round_dp(2),
            change_24h_pct = ?alert.context.change_24h_pct,
            "{} Volume spike",
            alert.severity.marker()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SpikeSeverity;
    use crate::window::MarketContext;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn test_log_notifier_acknowledges() {
        let alert = SpikeAlert {
            id: Uuid::new_v4(),
            instrument_id: "BTCUSDT".to_string(),
            current_value: dec!(350),
            baseline_value: dec!(100),
            multiplier: dec!(3.5),
            severity: SpikeSeverity::Strong,
            context: MarketContext::default(),
            detected_at: Utc::now(),
        };
        assert!(tokio_test::block_on(LogNotifier.notify(&alert)).is_ok());
    }
}
