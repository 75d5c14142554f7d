//! Spike signal module
//!
//! Classifies current volume against the instrument baseline

mod detector;
mod types;

pub use detector::{classify, SpikeDetector};
pub use types::{SpikeResult, SpikeSeverity};
