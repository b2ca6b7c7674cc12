//! Single-image prediction result.

use serde::{Deserialize, Serialize};

use crate::confidence::{format_coverage, FractionConfidence, PercentConfidence};

/// Visual explanation overlay, kept in the base64 form the service sent.
///
/// Decoding is deferred to export so a corrupt payload is reported at the
/// point the user asks for the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExplanationImage(String);

impl ExplanationImage {
    pub fn from_base64(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    pub fn as_base64(&self) -> &str {
        &self.0
    }
}

/// Classification of one image.
///
/// Optional metrics stay `None` when the service omits them; they are never
/// defaulted to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub label: String,
    pub confidence: PercentConfidence,
    pub prob_deforested: Option<FractionConfidence>,
    pub prob_non_deforested: Option<FractionConfidence>,
    pub veg_fraction: Option<f64>,
    pub veg_norm: Option<f64>,
    pub explanation_image: Option<ExplanationImage>,
}

impl InferenceResult {
    pub fn has_explanation(&self) -> bool {
        self.explanation_image.is_some()
    }

    /// One-line summary suitable for the clipboard.
    pub fn summary_line(&self) -> String {
        format!(
            "Prediction: {} ({}) - Vegetation Coverage: {}",
            self.label,
            self.confidence.display(),
            format_coverage(self.veg_fraction)
        )
    }
}
