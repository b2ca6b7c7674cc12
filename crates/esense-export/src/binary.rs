//! Downloadable files built from in-memory results.

use base64::{engine::general_purpose::STANDARD, Engine};

use esense_models::{BatchResult, ExplanationImage};

use crate::csv_export::batch_result_to_csv;
use crate::error::ExportResult;

/// File name offered for the explanation overlay.
pub const EXPLANATION_FILE_NAME: &str = "gradcam.jpg";
/// Content type of the explanation overlay.
pub const JPEG_MIME: &str = "image/jpeg";
/// File name offered for the batch export.
pub const BATCH_CSV_FILE_NAME: &str = "batch_results.csv";
/// Content type of the batch export.
pub const CSV_MIME: &str = "text/csv;charset=utf-8";

/// A file ready to be handed to a [`crate::BlobSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

impl ExportedFile {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Strictly decode a standard-alphabet base64 payload.
///
/// Padding is required and whitespace is not tolerated, so a damaged payload
/// fails instead of yielding truncated bytes.
pub fn decode_base64_to_binary(payload: &str) -> ExportResult<Vec<u8>> {
    Ok(STANDARD.decode(payload)?)
}

/// Decode the explanation overlay into a JPEG file.
pub fn explanation_file(image: &ExplanationImage) -> ExportResult<ExportedFile> {
    let bytes = decode_base64_to_binary(image.as_base64())?;
    Ok(ExportedFile::new(bytes, EXPLANATION_FILE_NAME, JPEG_MIME))
}

/// Render a batch result into a CSV file.
pub fn batch_csv_file(result: &BatchResult) -> ExportResult<ExportedFile> {
    let text = batch_result_to_csv(result)?;
    Ok(ExportedFile::new(text.into_bytes(), BATCH_CSV_FILE_NAME, CSV_MIME))
}
