//! Discord webhook notifier

use super::{Notifier, NotifyError, SpikeAlert};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::time::Duration;

const COLOR_UP: u32 = 0x00ff00;
const COLOR_DOWN: u32 = 0xff0000;

/// Format a number with K/M/B suffixes and two decimals
pub fn format_compact(value: Decimal) -> String {
    if value >= dec!(1000000000) {
        format!("{:.2}B", (value / dec!(1000000000)).round_dp(2))
    } else if value >= dec!(1000000) {
        format!("{:.2}M", (value / dec!(1000000)).round_dp(2))
    } else if value >= dec!(1000) {
        format!("{:.2}K", (value / dec!(1000)).round_dp(2))
    } else {
        format!("{:.2}", value.round_dp(2))
    }
}

#[derive(Debug, Serialize)]
struct WebhookMessage {
    embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
struct Embed {
    title: String,
    description: String,
    color: u32,
    timestamp: String,
    fields: Vec<EmbedField>,
    footer: EmbedFooter,
}

#[derive(Debug, Serialize)]
struct EmbedField {
    name: String,
    value: String,
    inline: bool,
}

#[derive(Debug, Serialize)]
struct EmbedFooter {
    text: String,
}

impl EmbedField {
    fn new(name: &str, value: String, inline: bool) -> Self {
        Self {
            name: name.to_string(),
            value,
            inline,
        }
    }
}

/// Posts spike alerts as Discord embeds
pub struct DiscordNotifier {
    webhook_url: String,
    client: Client,
}

impl DiscordNotifier {
    /// Create a notifier for a webhook URL
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            webhook_url: webhook_url.into(),
            client,
        })
    }

    fn build_message(alert: &SpikeAlert) -> WebhookMessage {
        let change = alert.context.change_24h_pct;
        let color = match change {
            Some(c) if c.is_sign_negative() && !c.is_zero() => COLOR_DOWN,
            _ => COLOR_UP,
        };
        let change_text = change
            .map(|c| format!("{:+.2}%", c.round_dp(2)))
            .unwrap_or_else(|| "n/a".to_string());

        let fields = vec![
            EmbedField::new(
                "📊 Multiplier",
                format!("**{:.2}x** baseline", alert.multiplier.round_dp(2)),
                true,
            ),
            EmbedField::new(
                "💰 Current Volume",
                format!("${}", format_compact(alert.current_value)),
                true,
            ),
            EmbedField::new(
                "📈 Normal Volume",
                format!("${}", format_compact(alert.baseline_value)),
                true,
            ),
            EmbedField::new("💹 24h Price", change_text, true),
            EmbedField::new(
                "🔗 Bybit",
                format!(
                    "[Open on Bybit](https://www.bybit.com/trade/usdt/{})",
                    alert.instrument_id
                ),
                false,
            ),
        ];

        WebhookMessage {
            embeds: vec![Embed {
                title: format!("{} VOLUME SPIKE DETECTED", alert.severity.marker()),
                description: format!("**{}** volume is surging", alert.instrument_id),
                color,
                timestamp: alert.detected_at.to_rfc3339(),
                fields,
                footer: EmbedFooter {
                    text: format!("vol-spike | alert {}", alert.id),
                },
            }],
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, alert: &SpikeAlert) -> Result<(), NotifyError> {
        let message = Self::build_message(alert);

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, body });
        }

        tracing::debug!(alert_id = %alert.id, instrument = %alert.instrument_id, "Discord alert delivered");
        Ok(())
    }
}
