//! Inference service request/response types.
//!
//! These mirror the JSON bodies exactly and are converted into the
//! `esense_models` types, which enforce value ranges.

use serde::Deserialize;

use esense_models::{
    BatchItem, BatchResult, BatchResultRow, BatchSummary, ExplanationImage, FractionConfidence,
    InferenceResult, PercentConfidence, RejectedImage,
};

use crate::error::{ClientError, ClientResult};

/// Body of a successful `POST /predict`.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictResponse {
    pub label: String,
    pub confidence: f64,
    #[serde(default)]
    pub prob_deforested: Option<f64>,
    #[serde(default)]
    pub prob_non_deforested: Option<f64>,
    #[serde(default)]
    pub veg_fraction: Option<f64>,
    #[serde(default)]
    pub veg_norm: Option<f64>,
    #[serde(default)]
    pub gradcam_base64: Option<String>,
}

/// One entry of the `results` array in a batch response.
///
/// Either a classification or an `error` for an image the service could not read.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchEntry {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub prob_deforested: Option<f64>,
    #[serde(default)]
    pub prob_non_deforested: Option<f64>,
    #[serde(default)]
    pub veg_fraction: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Summary block of a batch response.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SummaryBody {
    pub total: u32,
    pub deforested: u32,
    pub not_deforested: u32,
}

/// Body of a successful `POST /batch_predict`.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchPredictResponse {
    pub results: Vec<BatchEntry>,
    pub summary: SummaryBody,
}

/// Health check response.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Error body sent by the service alongside a non-success status.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceErrorBody {
    pub error: String,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ServiceErrorBody {
    pub fn message(&self) -> String {
        match &self.detail {
            Some(detail) if !detail.is_empty() => format!("{}: {}", self.error, detail),
            _ => self.error.clone(),
        }
    }
}

fn optional_fraction(value: Option<f64>) -> ClientResult<Option<FractionConfidence>> {
    value
        .map(FractionConfidence::new)
        .transpose()
        .map_err(ClientError::from)
}

impl TryFrom<PredictResponse> for InferenceResult {
    type Error = ClientError;

    fn try_from(body: PredictResponse) -> ClientResult<Self> {
        Ok(InferenceResult {
            label: body.label,
            confidence: PercentConfidence::new(body.confidence)?,
            prob_deforested: optional_fraction(body.prob_deforested)?,
            prob_non_deforested: optional_fraction(body.prob_non_deforested)?,
            veg_fraction: body.veg_fraction,
            veg_norm: body.veg_norm,
            explanation_image: body
                .gradcam_base64
                .filter(|payload| !payload.is_empty())
                .map(ExplanationImage::from_base64),
        })
    }
}

impl BatchEntry {
    fn into_item(self, index: usize) -> ClientResult<BatchItem> {
        let filename = self.filename.unwrap_or_default();

        if let Some(error) = self.error {
            return Ok(BatchItem::Rejected(RejectedImage { filename, error }));
        }

        let label = self.label.ok_or_else(|| {
            ClientError::invalid_response(format!("batch entry {} has no label", index))
        })?;
        let confidence = self.confidence.ok_or_else(|| {
            ClientError::invalid_response(format!("batch entry {} has no confidence", index))
        })?;

        Ok(BatchItem::Classified(BatchResultRow {
            filename,
            label,
            confidence: FractionConfidence::new(confidence)?,
            prob_deforested: optional_fraction(self.prob_deforested)?,
            prob_non_deforested: optional_fraction(self.prob_non_deforested)?,
            veg_fraction: self.veg_fraction,
        }))
    }
}

impl TryFrom<BatchPredictResponse> for BatchResult {
    type Error = ClientError;

    fn try_from(body: BatchPredictResponse) -> ClientResult<Self> {
        let items = body
            .results
            .into_iter()
            .enumerate()
            .map(|(index, entry)| entry.into_item(index))
            .collect::<ClientResult<Vec<_>>>()?;

        Ok(BatchResult {
            summary: BatchSummary {
                total: body.summary.total,
                deforested: body.summary.deforested,
                not_deforested: body.summary.not_deforested,
            },
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_predict_response_keeps_unknowns() {
        let body: PredictResponse =
            serde_json::from_value(json!({ "label": "Deforested", "confidence": 92.4 })).unwrap();
        let result = InferenceResult::try_from(body).unwrap();

        assert_eq!(result.confidence.value(), 92.4);
        assert_eq!(result.veg_fraction, None);
        assert_eq!(result.veg_norm, None);
        assert_eq!(result.prob_deforested, None);
        assert!(!result.has_explanation());
    }

    #[test]
    fn test_null_gradcam_is_no_explanation() {
        let body: PredictResponse = serde_json::from_value(json!({
            "label": "Not Deforested",
            "confidence": 88.0,
            "gradcam_base64": null
        }))
        .unwrap();
        assert!(!InferenceResult::try_from(body).unwrap().has_explanation());
    }

    #[test]
    fn test_percent_out_of_range_is_decode_error() {
        let body: PredictResponse =
            serde_json::from_value(json!({ "label": "Deforested", "confidence": 0.924e3 }))
                .unwrap();
        assert!(matches!(
            InferenceResult::try_from(body),
            Err(ClientError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_batch_entries_preserve_order_and_errors() {
        let body: BatchPredictResponse = serde_json::from_value(json!({
            "results": [
                { "filename": "b.jpg", "label": "Not Deforested", "confidence": 0.81,
                  "prob_deforested": 0.19, "prob_non_deforested": 0.81, "veg_fraction": 0.6 },
                { "filename": "broken.jpg", "error": "cannot identify image file" },
                { "filename": "a.jpg", "label": "Deforested", "confidence": 0.95,
                  "prob_deforested": null }
            ],
            "summary": { "total": 2, "deforested": 1, "not_deforested": 1 }
        }))
        .unwrap();

        let result = BatchResult::try_from(body).unwrap();
        let names: Vec<_> = result.items.iter().map(|item| item.filename()).collect();
        assert_eq!(names, vec!["b.jpg", "broken.jpg", "a.jpg"]);

        let last = result.rows().last().unwrap();
        assert_eq!(last.prob_deforested, None);
        assert_eq!(result.rejected().next().unwrap().error, "cannot identify image file");
    }

    #[test]
    fn test_batch_entry_without_label_is_decode_error() {
        let body: BatchPredictResponse = serde_json::from_value(json!({
            "results": [{ "filename": "a.jpg", "confidence": 0.5 }],
            "summary": { "total": 1, "deforested": 1, "not_deforested": 0 }
        }))
        .unwrap();

        let err = BatchResult::try_from(body).unwrap_err();
        assert_eq!(err.to_string(), "Invalid response: batch entry 0 has no label");
    }

    #[test]
    fn test_service_error_message() {
        let body: ServiceErrorBody =
            serde_json::from_value(json!({ "error": "invalid image", "detail": "truncated" }))
                .unwrap();
        assert_eq!(body.message(), "invalid image: truncated");
    }
}
