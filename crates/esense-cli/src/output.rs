//! Terminal rendering of results.

use std::io::Write;

use async_trait::async_trait;

use esense_export::{ClipboardSink, ExportError, ExportResult};
use esense_models::{format_coverage, BatchItem, InferenceResult};
use esense_session::BatchOutcome;

/// Clipboard stand-in that prints the text on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutClipboard;

#[async_trait]
impl ClipboardSink for StdoutClipboard {
    async fn write_text(&self, text: &str) -> ExportResult<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", text).map_err(|source| ExportError::Write {
            name: "stdout".to_string(),
            source,
        })
    }
}

pub fn render_prediction(result: &InferenceResult) -> String {
    let mut lines = vec![
        format!("Prediction:  {}", result.label),
        format!("Confidence:  {}", result.confidence.display()),
        format!("Vegetation:  {}", format_coverage(result.veg_fraction)),
    ];
    if let (Some(def), Some(non)) = (result.prob_deforested, result.prob_non_deforested) {
        lines.push(format!(
            "Classes:     deforested {} / not deforested {}",
            def.as_percent_display(),
            non.as_percent_display()
        ));
    }
    if let Some(norm) = result.veg_norm {
        lines.push(format!("Veg index:   {:.3}", norm));
    }
    lines.join("\n")
}

pub fn render_batch(outcome: &BatchOutcome) -> String {
    let summary = outcome.result.summary;
    let mut lines = vec![
        format!(
            "Total: {}  Deforested: {}  Not deforested: {}",
            summary.total, summary.deforested, summary.not_deforested
        ),
        format!(
            "Majority-label share (not verified accuracy): {}%",
            outcome.accuracy_estimate()
        ),
    ];
    for warning in &outcome.warnings {
        lines.push(format!("warning: {}", warning));
    }
    for item in &outcome.result.items {
        lines.push(match item {
            BatchItem::Classified(row) => format!(
                "  {}  {}  {}  veg {}",
                row.filename,
                row.label,
                row.confidence.as_percent_display(),
                format_coverage(row.veg_fraction)
            ),
            BatchItem::Rejected(rejected) => {
                format!("  {}  rejected: {}", rejected.filename, rejected.error)
            }
        });
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    use esense_models::{
        BatchResult, BatchResultRow, BatchSummary, FractionConfidence, PercentConfidence,
        RejectedImage,
    };

    #[test]
    fn test_render_prediction_marks_unknowns() {
        let result = InferenceResult {
            label: "Not Deforested".to_string(),
            confidence: PercentConfidence::new(71.5).unwrap(),
            prob_deforested: None,
            prob_non_deforested: None,
            veg_fraction: None,
            veg_norm: None,
            explanation_image: None,
        };

        let text = render_prediction(&result);
        assert!(text.contains("71.5%"));
        assert!(text.contains("Vegetation:  n/a"));
        assert!(!text.contains("Classes"));
    }

    #[test]
    fn test_render_batch_lists_warnings_and_rejections() {
        let outcome = BatchOutcome::new(BatchResult {
            summary: BatchSummary {
                total: 2,
                deforested: 1,
                not_deforested: 0,
            },
            items: vec![
                BatchItem::Classified(BatchResultRow {
                    filename: "a.jpg".to_string(),
                    label: "Deforested".to_string(),
                    confidence: FractionConfidence::new(0.873).unwrap(),
                    prob_deforested: None,
                    prob_non_deforested: None,
                    veg_fraction: Some(0.25),
                }),
                BatchItem::Rejected(RejectedImage {
                    filename: "b.txt".to_string(),
                    error: "not an image".to_string(),
                }),
            ],
        });

        let text = render_batch(&outcome);
        assert!(text.contains("a.jpg  Deforested  87.3%  veg 25.0%"));
        assert!(text.contains("b.txt  rejected: not an image"));
        assert_eq!(text.matches("warning:").count(), 2);
    }
}
