//! Confidence bands for predicted aligned error values.
//!
//! A PAE value is an expected positional error in Angstroms. Lower error means
//! the relative placement of two residues is trusted more.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors below this are high confidence
pub const HIGH_CONFIDENCE_BELOW: f64 = 5.0;

/// Errors below this (and at least `HIGH_CONFIDENCE_BELOW`) are medium confidence
pub const MEDIUM_CONFIDENCE_BELOW: f64 = 15.0;

/// Discretized confidence for one error value.
///
/// Ordering follows trust: `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    Low,
    Medium,
    High,
}

impl ConfidenceBand {
    pub const ALL: [ConfidenceBand; 3] = [
        ConfidenceBand::High,
        ConfidenceBand::Medium,
        ConfidenceBand::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "high",
            ConfidenceBand::Medium => "medium",
            ConfidenceBand::Low => "low",
        }
    }

    /// Human readable PAE range for the band
    pub fn range_label(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "below 5 Å",
            ConfidenceBand::Medium => "5 to 15 Å",
            ConfidenceBand::Low => "15 Å or more",
        }
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConfidenceBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(ConfidenceBand::High),
            "medium" => Ok(ConfidenceBand::Medium),
            "low" => Ok(ConfidenceBand::Low),
            other => Err(format!(
                "Unknown confidence band: '{}'. Valid values: high, medium, low",
                other
            )),
        }
    }
}

/// Classify an error value into its confidence band.
///
/// Callers guarantee finite, non-negative input (see `ErrorMatrix::new`).
pub fn classify(value: f64) -> ConfidenceBand {
    if value < HIGH_CONFIDENCE_BELOW {
        ConfidenceBand::High
    } else if value < MEDIUM_CONFIDENCE_BELOW {
        ConfidenceBand::Medium
    } else {
        ConfidenceBand::Low
    }
}
