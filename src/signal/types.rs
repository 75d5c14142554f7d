//! Spike classification types

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Outcome of comparing current volume to its baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpikeResult {
    pub is_spike: bool,
    /// current / baseline, or 1 when the baseline is zero
    pub multiplier: Decimal,
}

impl SpikeResult {
    /// Non-spike with a neutral multiplier
    pub fn neutral() -> Self {
        Self {
            is_spike: false,
            multiplier: Decimal::ONE,
        }
    }

    /// Severity bucket for the multiplier
    pub fn severity(&self) -> SpikeSeverity {
        SpikeSeverity::from_multiplier(self.multiplier)
    }
}

/// How far above baseline a spike is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpikeSeverity {
    /// Below 3x
    Elevated,
    /// 3x to 5x
    Strong,
    /// 5x and above
    Extreme,
}

impl SpikeSeverity {
    /// Bucket a multiplier
    pub fn from_multiplier(multiplier: Decimal) -> Self {
        if multiplier >= dec!(5) {
            Self::Extreme
        } else if multiplier >= dec!(3) {
            Self::Strong
        } else {
            Self::Elevated
        }
    }

    /// Headline marker used in notifications
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Extreme => "🚀",
            Self::Strong => "📈",
            Self::Elevated => "⚠️",
        }
    }
}
