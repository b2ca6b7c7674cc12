//! CSV rendering of batch results.
//!
//! Every field is quoted, embedded quotes are doubled, fields are separated
//! by a comma and records by a single LF. Missing values become an empty
//! quoted field (`""`), never the text `null`.

use csv::{QuoteStyle, Terminator, WriterBuilder};

use esense_models::{BatchItem, BatchResult};

use crate::error::{ExportError, ExportResult};

/// Column order of the batch export.
pub const BATCH_CSV_HEADER: [&str; 6] = [
    "filename",
    "label",
    "confidence",
    "prob_deforested",
    "prob_non_deforested",
    "veg_fraction",
];

/// Render a header and rows to CSV text.
///
/// Records are joined by the terminator; there is no trailing newline.
pub fn to_csv<S: AsRef<str>>(header: &[S], rows: &[Vec<Option<String>>]) -> ExportResult<String> {
    let mut wtr = WriterBuilder::new()
        .delimiter(b',')
        .quote(b'"')
        .double_quote(true)
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(vec![]);

    wtr.write_record(header.iter().map(|h| h.as_ref()))?;
    for row in rows {
        wtr.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| ExportError::csv(e.to_string()))?;
    let mut text = String::from_utf8(bytes).map_err(|e| ExportError::csv(e.to_string()))?;

    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Cells of one batch item in [`BATCH_CSV_HEADER`] order.
pub fn batch_item_cells(item: &BatchItem) -> Vec<Option<String>> {
    match item {
        BatchItem::Classified(row) => vec![
            Some(row.filename.clone()),
            Some(row.label.clone()),
            Some(row.confidence.to_string()),
            row.prob_deforested.map(|p| p.to_string()),
            row.prob_non_deforested.map(|p| p.to_string()),
            row.veg_fraction.map(|v| v.to_string()),
        ],
        // Unclassified images keep their place with only the filename filled in.
        BatchItem::Rejected(rejected) => {
            let mut cells = vec![None; BATCH_CSV_HEADER.len()];
            cells[0] = Some(rejected.filename.clone());
            cells
        }
    }
}

/// Render a whole batch result, one record per item in response order.
pub fn batch_result_to_csv(result: &BatchResult) -> ExportResult<String> {
    let rows: Vec<_> = result.items.iter().map(batch_item_cells).collect();
    to_csv(&BATCH_CSV_HEADER, &rows)
}
