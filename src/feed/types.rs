//! Ticker feed types

use serde::Deserialize;
use thiserror::Error;

/// Errors from a ticker fetch; all are transient from the monitor's view
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (connect, timeout, TLS)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-success HTTP status
    #[error("Bybit returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    /// API-level error code
    #[error("Bybit API error {code}: {message}")]
    Api { code: i64, message: String },
    /// Body could not be decoded
    #[error("Failed to decode ticker response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            Self::Api { .. } | Self::Decode(_) => false,
        }
    }
}

/// Envelope of a Bybit v5 REST response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BybitResponse<T> {
    pub ret_code: i64,
    #[serde(default)]
    pub ret_msg: String,
    pub result: Option<T>,
}

/// `result` of `/v5/market/tickers`
#[derive(Debug, Deserialize)]
pub(crate) struct TickerList {
    #[serde(default)]
    pub list: Vec<BybitTicker>,
}

/// One linear ticker; numeric fields arrive as strings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BybitTicker {
    pub symbol: String,
    #[serde(default)]
    pub last_price: String,
    #[serde(default)]
    pub price_24h_pcnt: String,
    #[serde(default)]
    pub high_price_24h: String,
    #[serde(default)]
    pub low_price_24h: String,
    #[serde(default)]
    pub volume_24h: String,
    #[serde(default)]
    pub turnover_24h: String,
    #[serde(default)]
    pub open_interest: String,
    #[serde(default)]
    pub funding_rate: String,
}
