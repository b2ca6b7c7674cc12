//! Batch prediction results and their aggregate summary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::confidence::FractionConfidence;

/// Label the service assigns to deforested tiles.
pub const LABEL_DEFORESTED: &str = "Deforested";
/// Label the service assigns to intact tiles.
pub const LABEL_NOT_DEFORESTED: &str = "Not Deforested";

/// One classified image in a batch response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResultRow {
    pub filename: String,
    pub label: String,
    pub confidence: FractionConfidence,
    pub prob_deforested: Option<FractionConfidence>,
    pub prob_non_deforested: Option<FractionConfidence>,
    pub veg_fraction: Option<f64>,
}

/// An image the service could not classify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedImage {
    pub filename: String,
    pub error: String,
}

/// One entry of a batch response, in response order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchItem {
    Classified(BatchResultRow),
    Rejected(RejectedImage),
}

impl BatchItem {
    pub fn filename(&self) -> &str {
        match self {
            BatchItem::Classified(row) => &row.filename,
            BatchItem::Rejected(rejected) => &rejected.filename,
        }
    }
}

/// Aggregate counts reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: u32,
    pub deforested: u32,
    pub not_deforested: u32,
}

impl BatchSummary {
    /// Share of the majority label, in whole percent.
    ///
    /// This is a heuristic: it says how lopsided the batch is, not how often
    /// the model was right. There is no ground truth to compare against.
    /// Returns 0 for an empty batch.
    pub fn accuracy_estimate(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let majority = self.deforested.max(self.not_deforested) as f64;
        (majority / self.total as f64 * 100.0).round() as u32
    }

    pub fn counts_are_consistent(&self) -> bool {
        self.deforested as u64 + self.not_deforested as u64 == self.total as u64
    }
}

/// A non-fatal inconsistency between the summary and the rows it describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataIntegrityWarning {
    /// `deforested + not_deforested` does not add up to `total`.
    CountMismatch {
        total: u32,
        deforested: u32,
        not_deforested: u32,
    },
    /// `total` differs from the number of classified rows returned.
    RowCountMismatch { total: u32, classified_rows: usize },
}

impl fmt::Display for DataIntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataIntegrityWarning::CountMismatch {
                total,
                deforested,
                not_deforested,
            } => write!(
                f,
                "summary counts do not add up: {} deforested + {} not deforested != {} total",
                deforested, not_deforested, total
            ),
            DataIntegrityWarning::RowCountMismatch {
                total,
                classified_rows,
            } => write!(
                f,
                "summary reports {} classified images but {} rows were returned",
                total, classified_rows
            ),
        }
    }
}

/// Parsed batch response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub summary: BatchSummary,
    pub items: Vec<BatchItem>,
}

impl BatchResult {
    /// Classified rows in response order.
    pub fn rows(&self) -> impl Iterator<Item = &BatchResultRow> {
        self.items.iter().filter_map(|item| match item {
            BatchItem::Classified(row) => Some(row),
            BatchItem::Rejected(_) => None,
        })
    }

    pub fn rejected(&self) -> impl Iterator<Item = &RejectedImage> {
        self.items.iter().filter_map(|item| match item {
            BatchItem::Rejected(rejected) => Some(rejected),
            BatchItem::Classified(_) => None,
        })
    }

    /// Every integrity problem found, empty when the response is consistent.
    pub fn integrity_warnings(&self) -> Vec<DataIntegrityWarning> {
        let mut warnings = Vec::new();
        let summary = self.summary;

        if !summary.counts_are_consistent() {
            warnings.push(DataIntegrityWarning::CountMismatch {
                total: summary.total,
                deforested: summary.deforested,
                not_deforested: summary.not_deforested,
            });
        }

        let classified_rows = self.rows().count();
        if classified_rows != summary.total as usize {
            warnings.push(DataIntegrityWarning::RowCountMismatch {
                total: summary.total,
                classified_rows,
            });
        }

        warnings
    }
}
