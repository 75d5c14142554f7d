//! Bybit REST ticker feed
//!
//! Polls `/v5/market/tickers` for linear perpetuals and turns each USDT
//! ticker into a volume observation in quote currency.

use super::types::{BybitResponse, BybitTicker, TickerList};
use super::{FetchError, ObservationSource};
use crate::config::FeedConfig;
use crate::telemetry::{increment_counter, CounterMetric};
use crate::window::{MarketContext, Observation};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::sleep;

/// Bybit API base URL
pub const BYBIT_API_URL: &str = "https://api.bybit.com";

/// Configuration for the Bybit client
#[derive(Debug, Clone)]
pub struct BybitConfig {
    /// Base URL for the REST API
    pub base_url: String,
    /// Product category (e.g., "linear")
    pub category: String,
    /// Only symbols ending with this are tracked
    pub quote_suffix: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries after the first failed attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Upper bound for the retry delay
    pub max_backoff: Duration,
}

impl Default for BybitConfig {
    fn default() -> Self {
        Self {
            base_url: BYBIT_API_URL.to_string(),
            category: "linear".to_string(),
            quote_suffix: "USDT".to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 2,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl From<&FeedConfig> for BybitConfig {
    fn from(config: &FeedConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            category: config.category.clone(),
            quote_suffix: config.quote_suffix.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
            max_retries: config.max_retries,
            ..Default::default()
        }
    }
}

/// Client for Bybit's market ticker endpoint
pub struct BybitClient {
    config: BybitConfig,
    client: Client,
}

impl BybitClient {
    /// Create a client with default configuration
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(BybitConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: BybitConfig) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn tickers_url(&self) -> String {
        format!("{}/v5/market/tickers", self.config.base_url.trim_end_matches('/'))
    }

    /// Fetch all tracked tickers, retrying transient failures with backoff
    pub async fn fetch_tickers(&self) -> Result<Vec<Observation>, FetchError> {
        let mut attempt = 0;

        loop {
            match self.fetch_once().await {
                Ok(observations) => return Ok(observations),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = backoff_delay(
                        self.config.initial_backoff,
                        self.config.max_backoff,
                        attempt,
                    );
                    attempt += 1;
                    tracing::warn!(
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Ticker fetch failed, retrying"
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self) -> Result<Vec<Observation>, FetchError> {
        let url = self.tickers_url();
        tracing::debug!(url = %url, category = %self.config.category, "Fetching tickers");

        let response = self
            .client
            .get(&url)
            .query(&[("category", self.config.category.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let body = response.text().await?;
        parse_tickers(&body, &self.config.quote_suffix, Utc::now())
    }
}

#[async_trait]
impl ObservationSource for BybitClient {
    async fn fetch_observations(&self) -> Vec<Observation> {
        match self.fetch_tickers().await {
            Ok(observations) => observations,
            Err(e) => {
                increment_counter(CounterMetric::FetchFailures, 1);
                tracing::warn!(error = %e, "Ticker fetch failed, treating cycle as empty");
                Vec::new()
            }
        }
    }
}

/// Delay before retry number `attempt` (zero-based): `initial` doubled per
/// attempt, capped at `max`
pub(crate) fn backoff_delay(initial: Duration, max: Duration, attempt: u32) -> Duration {
    2u32.checked_pow(attempt)
        .and_then(|factor| initial.checked_mul(factor))
        .map_or(max, |delay| delay.min(max))
}

/// Decode a tickers response body into observations stamped `observed_at`
pub(crate) fn parse_tickers(
    body: &str,
    quote_suffix: &str,
    observed_at: DateTime<Utc>,
) -> Result<Vec<Observation>, FetchError> {
    let response: BybitResponse<TickerList> = serde_json::from_str(body)?;

    if response.ret_code != 0 {
        return Err(FetchError::Api {
            code: response.ret_code,
            message: response.ret_msg,
        });
    }

    let tickers = response.result.map(|r| r.list).unwrap_or_default();
    let total = tickers.len();
    let observations: Vec<Observation> = tickers
        .iter()
        .filter(|t| t.symbol.ends_with(quote_suffix))
        .filter_map(|t| to_observation(t, observed_at))
        .collect();

    tracing::debug!(total, tracked = observations.len(), "Parsed tickers");
    Ok(observations)
}

fn parse_opt(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Convert a ticker; returns `None` when price or volume is unusable
fn to_observation(ticker: &BybitTicker, observed_at: DateTime<Utc>) -> Option<Observation> {
    let (Some(price), Some(volume_24h)) =
        (parse_opt(&ticker.last_price), parse_opt(&ticker.volume_24h))
    else {
        tracing::debug!(symbol = %ticker.symbol, "Skipping ticker with malformed price or volume");
        return None;
    };

    let volume_usd = volume_24h.checked_mul(price)?;

    let context = MarketContext {
        price: Some(price),
        change_24h_pct: parse_opt(&ticker.price_24h_pcnt).and_then(|p| p.checked_mul(dec!(100))),
        volume_24h: Some(volume_24h),
        high_24h: parse_opt(&ticker.high_price_24h),
        low_24h: parse_opt(&ticker.low_price_24h),
        open_interest_usd: parse_opt(&ticker.open_interest).and_then(|oi| oi.checked_mul(price)),
        funding_rate_pct: parse_opt(&ticker.funding_rate).and_then(|f| f.checked_mul(dec!(100))),
    };

    Some(Observation::new(ticker.symbol.clone(), volume_usd, observed_at).with_context(context))
}
