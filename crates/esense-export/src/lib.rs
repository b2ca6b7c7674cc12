//! Export engine for inference results.
//!
//! This crate provides:
//! - CSV rendering of batch results
//! - Strict base64 decoding of the explanation overlay
//! - Sink traits through which hosts receive files and clipboard text
//!
//! Nothing here performs network I/O; every function works on a snapshot
//! handed in by the caller.

pub mod binary;
pub mod csv_export;
pub mod error;
pub mod sink;

pub use binary::{
    batch_csv_file, decode_base64_to_binary, explanation_file, ExportedFile,
    BATCH_CSV_FILE_NAME, CSV_MIME, EXPLANATION_FILE_NAME, JPEG_MIME,
};
pub use csv_export::{batch_item_cells, batch_result_to_csv, to_csv, BATCH_CSV_HEADER};
pub use error::{ExportError, ExportResult};
pub use sink::{BlobSink, ClipboardSink, DirectorySink, MemorySink};
