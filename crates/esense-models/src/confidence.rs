//! Confidence scales.
//!
//! The service reports single-image confidence as a percentage (0-100) and
//! batch-row confidence as a fraction (0-1). The two are kept as separate
//! types so a value can never be rendered on the wrong scale.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Confidence on a 0-100 scale, as returned by the single predict endpoint.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PercentConfidence(f64);

impl PercentConfidence {
    pub fn new(value: f64) -> ModelResult<Self> {
        if value.is_finite() && (0.0..=100.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ModelError::PercentOutOfRange(value))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Render the value as received, e.g. `92.4%`.
    pub fn display(&self) -> String {
        format!("{}%", self.0)
    }
}

impl fmt::Display for PercentConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Probability on a 0-1 scale, as returned for batch rows and class probabilities.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FractionConfidence(f64);

impl FractionConfidence {
    pub fn new(value: f64) -> ModelResult<Self> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ModelError::FractionOutOfRange(value))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Render as a percentage with one decimal place, e.g. `87.3%`.
    pub fn as_percent_display(&self) -> String {
        format!("{:.1}%", self.0 * 100.0)
    }
}

impl fmt::Display for FractionConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Render an optional vegetation fraction as a percentage, or `n/a` when unknown.
pub fn format_coverage(fraction: Option<f64>) -> String {
    match fraction {
        Some(v) => format!("{:.1}%", v * 100.0),
        None => "n/a".to_string(),
    }
}
