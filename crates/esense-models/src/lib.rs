//! Shared data models for the EarthSense inference client.
//!
//! This crate provides Serde-serializable types for:
//! - Selected images and their display metadata
//! - Single-image prediction results
//! - Batch results, summary counts and integrity checks
//! - The two confidence scales used by the service

pub mod batch;
pub mod confidence;
pub mod error;
pub mod handle;
pub mod prediction;

// Re-export common types
pub use batch::{
    BatchItem, BatchResult, BatchResultRow, BatchSummary, DataIntegrityWarning, RejectedImage,
    LABEL_DEFORESTED, LABEL_NOT_DEFORESTED,
};
pub use confidence::{format_coverage, FractionConfidence, PercentConfidence};
pub use error::{ModelError, ModelResult};
pub use handle::{ImageDimensions, ImageHandle};
pub use prediction::{ExplanationImage, InferenceResult};
