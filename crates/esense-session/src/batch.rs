//! Batch inference controller.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, Instrument};

use esense_client::InferenceApi;
use esense_export::{batch_csv_file, BlobSink, ExportedFile};
use esense_models::{BatchResult, DataIntegrityWarning, ImageHandle};

use crate::error::{SessionError, SessionResult};
use crate::logging::SubmissionLogger;
use crate::state::{ControllerState, PendingSubmission, Phase, StateSlot, SubmitOutcome};

const CONTROLLER: &str = "batch";
const NO_IMAGES: &str = "no images selected";

/// A batch response together with what was found wrong with it.
///
/// Integrity problems do not fail the submission. The service's numbers are
/// kept as received and every inconsistency is listed in `warnings` and
/// logged, so the host can show the counts next to an explicit notice.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub result: BatchResult,
    pub warnings: Vec<DataIntegrityWarning>,
}

impl BatchOutcome {
    pub fn new(result: BatchResult) -> Self {
        let warnings = result.integrity_warnings();
        Self { result, warnings }
    }

    pub fn is_consistent(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Majority-label share of the batch. See [`esense_models::BatchSummary::accuracy_estimate`].
    pub fn accuracy_estimate(&self) -> u32 {
        self.result.summary.accuracy_estimate()
    }
}

/// State of the batch controller.
pub type BatchState = ControllerState<Vec<ImageHandle>, BatchOutcome>;

/// Owns the lifecycle of a set of images submitted together.
#[derive(Clone)]
pub struct BatchInferenceController {
    api: Arc<dyn InferenceApi>,
    blobs: Arc<dyn BlobSink>,
    slot: Arc<Mutex<StateSlot<Vec<ImageHandle>, BatchOutcome>>>,
}

impl BatchInferenceController {
    pub fn new(api: Arc<dyn InferenceApi>, blobs: Arc<dyn BlobSink>) -> Self {
        Self {
            api,
            blobs,
            slot: Arc::new(Mutex::new(StateSlot::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StateSlot<Vec<ImageHandle>, BatchOutcome>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> BatchState {
        self.lock().state().clone()
    }

    pub fn phase(&self) -> Phase {
        self.lock().state().phase()
    }

    /// Replace the held set. An empty set is stored but cannot be submitted.
    pub fn select_many(&self, images: Vec<ImageHandle>) {
        debug!(controller = CONTROLLER, count = images.len(), "Images selected");
        self.lock().select(images);
    }

    pub fn reset(&self) {
        debug!(controller = CONTROLLER, "Controller reset");
        self.lock().reset();
    }

    /// Send every held image in one request.
    ///
    /// Same contract as [`crate::SingleInferenceController::submit`].
    pub async fn submit(&self) -> SessionResult<SubmitOutcome> {
        let (pending, images) =
            PendingSubmission::begin(&*self.slot, NO_IMAGES, |images: &Vec<ImageHandle>| {
                if images.is_empty() {
                    return Err(SessionError::validation(NO_IMAGES));
                }
                match images.iter().find(|image| image.is_empty()) {
                    Some(image) => Err(SessionError::validation(format!(
                        "image '{}' is empty",
                        image.filename()
                    ))),
                    None => Ok(()),
                }
            })?;

        let logger = SubmissionLogger::new(CONTROLLER, pending.epoch());
        logger.log_start(images.len());

        let response = self
            .api
            .submit_batch(&images)
            .instrument(logger.create_span())
            .await
            .map(BatchOutcome::new)
            .map_err(SessionError::from);

        match &response {
            Ok(outcome) => {
                for warning in &outcome.warnings {
                    logger.log_warning(&warning.to_string());
                }
                logger.log_completion(&format!(
                    "{} images, {} deforested, {} not deforested",
                    outcome.result.summary.total,
                    outcome.result.summary.deforested,
                    outcome.result.summary.not_deforested
                ));
            }
            Err(e) => logger.log_failure(&e.to_string()),
        }

        let outcome = pending.finish(response);
        if outcome == SubmitOutcome::Superseded {
            logger.log_discarded();
        }
        Ok(outcome)
    }

    /// Majority-label share of the current result, if there is one.
    pub fn accuracy_estimate(&self) -> Option<u32> {
        self.lock()
            .state()
            .result()
            .map(BatchOutcome::accuracy_estimate)
    }

    /// Integrity problems of the current result; empty when there is none.
    pub fn integrity_warnings(&self) -> Vec<DataIntegrityWarning> {
        self.lock()
            .state()
            .result()
            .map(|outcome| outcome.warnings.clone())
            .unwrap_or_default()
    }

    /// Render the current result as CSV and hand it to the blob sink.
    pub async fn export_results(&self) -> SessionResult<ExportedFile> {
        let result = self
            .lock()
            .state()
            .result()
            .map(|outcome| outcome.result.clone())
            .ok_or_else(|| SessionError::no_data("no batch results to export"))?;

        let file = batch_csv_file(&result)?;
        self.blobs
            .write_file(&file.bytes, &file.file_name, &file.mime_type)
            .await?;
        Ok(file)
    }
}
