//! Observation types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Market data that travels with an observation but never enters baseline math
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    /// Last traded price
    pub price: Option<Decimal>,
    /// 24h price change in percent
    pub change_24h_pct: Option<Decimal>,
    /// 24h volume in base units
    pub volume_24h: Option<Decimal>,
    /// 24h high
    pub high_24h: Option<Decimal>,
    /// 24h low
    pub low_24h: Option<Decimal>,
    /// Open interest in quote currency
    pub open_interest_usd: Option<Decimal>,
    /// Funding rate in percent
    pub funding_rate_pct: Option<Decimal>,
}

/// A single volume sample for one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Instrument symbol (e.g., "BTCUSDT")
    pub instrument_id: String,
    /// Volume in quote-currency notional
    pub volume: Decimal,
    /// When the sample was taken
    pub observed_at: DateTime<Utc>,
    /// Auxiliary market context
    #[serde(default)]
    pub context: MarketContext,
}

impl Observation {
    /// Create an observation without market context
    pub fn new(instrument_id: impl Into<String>, volume: Decimal, observed_at: DateTime<Utc>) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            volume,
            observed_at,
            context: MarketContext::default(),
        }
    }

    /// Create an observation from a binary float volume
    pub fn from_f64(
        instrument_id: impl Into<String>,
        volume: f64,
        observed_at: DateTime<Utc>,
    ) -> Result<Self, InvalidObservation> {
        let instrument_id = instrument_id.into();
        if !volume.is_finite() {
            return Err(InvalidObservation::NonFinite { instrument_id });
        }
        let volume = Decimal::try_from(volume)
            .map_err(|_| InvalidObservation::NonFinite {
                instrument_id: instrument_id.clone(),
            })?;
        let observation = Self::new(instrument_id, volume, observed_at);
        observation.validate()?;
        Ok(observation)
    }

    /// Attach market context
    pub fn with_context(mut self, context: MarketContext) -> Self {
        self.context = context;
        self
    }

    /// Check the sample is usable for baseline math
    pub fn validate(&self) -> Result<(), InvalidObservation> {
        if self.instrument_id.trim().is_empty() {
            return Err(InvalidObservation::EmptyInstrument);
        }
        if self.volume.is_sign_negative() && !self.volume.is_zero() {
            return Err(InvalidObservation::NegativeVolume {
                instrument_id: self.instrument_id.clone(),
                volume: self.volume,
            });
        }
        Ok(())
    }
}

/// Malformed sample, dropped without touching the window
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidObservation {
    /// Volume below zero
    #[error("negative volume {volume} for {instrument_id}")]
    NegativeVolume {
        instrument_id: String,
        volume: Decimal,
    },
    /// NaN or infinite volume
    #[error("non-finite volume for {instrument_id}")]
    NonFinite { instrument_id: String },
    /// Blank instrument id
    #[error("observation has an empty instrument id")]
    EmptyInstrument,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_accepts_zero_volume() {
        let obs = Observation::new("BTCUSDT", dec!(0), Utc::now());
        assert!(obs.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_volume() {
        let obs = Observation::new("BTCUSDT", dec!(-1.5), Utc::now());
        assert_eq!(
            obs.validate(),
            Err(InvalidObservation::NegativeVolume {
                instrument_id: "BTCUSDT".to_string(),
                volume: dec!(-1.5),
            })
        );
    }

    #[test]
    fn test_validate_rejects_blank_instrument() {
        let obs = Observation::new("  ", dec!(10), Utc::now());
        assert_eq!(obs.validate(), Err(InvalidObservation::EmptyInstrument));
    }

    #[test]
    fn test_from_f64_rejects_non_finite() {
        let now = Utc::now();
        assert!(matches!(
            Observation::from_f64("ETHUSDT", f64::NAN, now),
            Err(InvalidObservation::NonFinite { .. })
        ));
        assert!(matches!(
            Observation::from_f64("ETHUSDT", f64::INFINITY, now),
            Err(InvalidObservation::NonFinite { .. })
        ));
    }

    #[test]
    fn test_from_f64_valid() {
        let obs = Observation::from_f64("ETHUSDT", 1250.5, Utc::now()).unwrap();
        assert_eq!(obs.volume, dec!(1250.5));
        assert_eq!(obs.context, MarketContext::default());
    }

    #[test]
    fn test_context_roundtrips_through_json() {
        let obs = Observation::new("SOLUSDT", dec!(42), Utc::now()).with_context(MarketContext {
            price: Some(dec!(150.25)),
            change_24h_pct: Some(dec!(-3.1)),
            ..Default::default()
        });
        let json = serde_json::to_string(&obs).unwrap();
        let back: Observation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, obs);
    }
}
