//! Single-image inference controller.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, Instrument};

use esense_client::InferenceApi;
use esense_export::{explanation_file, BlobSink, ClipboardSink, ExportedFile};
use esense_models::{ImageDimensions, ImageHandle, InferenceResult};

use crate::error::{SessionError, SessionResult};
use crate::logging::SubmissionLogger;
use crate::state::{
    ControllerState, PendingSubmission, Phase, SlotHolder, StateSlot, SubmitOutcome,
};

const CONTROLLER: &str = "single";
const NO_IMAGE: &str = "Please choose an image (satellite/top-down preferred).";

/// State of the single-image controller.
pub type SingleState = ControllerState<ImageHandle, InferenceResult>;

struct Inner {
    slot: StateSlot<ImageHandle, InferenceResult>,
    explanation_visible: bool,
}

impl SlotHolder<ImageHandle, InferenceResult> for Mutex<Inner> {
    fn with_slot<T>(
        &self,
        f: impl FnOnce(&mut StateSlot<ImageHandle, InferenceResult>) -> T,
    ) -> T {
        let mut inner = self.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut inner.slot)
    }
}

/// Owns the lifecycle of one image: selection, submission, result or error.
///
/// Cloning yields another handle to the same controller, so a host can
/// reset it while a submission is pending elsewhere.
#[derive(Clone)]
pub struct SingleInferenceController {
    api: Arc<dyn InferenceApi>,
    blobs: Arc<dyn BlobSink>,
    clipboard: Arc<dyn ClipboardSink>,
    inner: Arc<Mutex<Inner>>,
}

impl SingleInferenceController {
    pub fn new(
        api: Arc<dyn InferenceApi>,
        blobs: Arc<dyn BlobSink>,
        clipboard: Arc<dyn ClipboardSink>,
    ) -> Self {
        Self {
            api,
            blobs,
            clipboard,
            inner: Arc::new(Mutex::new(Inner {
                slot: StateSlot::new(),
                explanation_visible: true,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SingleState {
        self.lock().slot.state().clone()
    }

    pub fn phase(&self) -> Phase {
        self.lock().slot.state().phase()
    }

    /// Pixel dimensions of the held image, when its header could be read.
    pub fn image_dimensions(&self) -> Option<ImageDimensions> {
        self.lock()
            .slot
            .state()
            .selection()
            .and_then(ImageHandle::dimensions)
    }

    /// Hold a new image, discarding any previous result.
    pub fn select(&self, image: ImageHandle) {
        debug!(
            controller = CONTROLLER,
            filename = %image.filename(),
            size = image.len(),
            dimensions = ?image.dimensions(),
            "Image selected"
        );
        self.lock().slot.select(image);
    }

    /// Drop the image and any result. A pending response will be discarded.
    pub fn reset(&self) {
        debug!(controller = CONTROLLER, "Controller reset");
        let mut inner = self.lock();
        inner.slot.reset();
        inner.explanation_visible = true;
    }

    /// Send the held image for classification.
    ///
    /// Fails without touching the state when nothing is selected or a
    /// request is already in flight. Otherwise the outcome lands in the
    /// state as `Succeeded` or `Failed`, unless the controller was reset or
    /// given a new image meanwhile. Dropping the returned future before it
    /// resolves leaves the controller `Failed` with a transport error.
    pub async fn submit(&self) -> SessionResult<SubmitOutcome> {
        let (pending, image) =
            PendingSubmission::begin(&*self.inner, NO_IMAGE, |image: &ImageHandle| {
                if image.is_empty() {
                    Err(SessionError::validation(format!(
                        "image '{}' is empty",
                        image.filename()
                    )))
                } else {
                    Ok(())
                }
            })?;
        let logger = SubmissionLogger::new(CONTROLLER, pending.epoch());
        logger.log_start(1);

        let response = self
            .api
            .submit_single(&image)
            .instrument(logger.create_span())
            .await
            .map_err(SessionError::from);

        match &response {
            Ok(result) => logger.log_completion(&format!(
                "{} ({})",
                result.label,
                result.confidence.display()
            )),
            Err(e) => logger.log_failure(&e.to_string()),
        }

        let outcome = pending.finish(response);
        match outcome {
            SubmitOutcome::Completed => self.lock().explanation_visible = true,
            SubmitOutcome::Superseded => logger.log_discarded(),
        }
        Ok(outcome)
    }

    /// Whether the explanation overlay should be shown.
    pub fn explanation_visible(&self) -> bool {
        self.lock().explanation_visible
    }

    /// Flip the overlay display flag; returns the new value.
    pub fn toggle_explanation_visibility(&self) -> SessionResult<bool> {
        let mut inner = self.lock();
        match inner.slot.state().result() {
            Some(result) if result.has_explanation() => {
                inner.explanation_visible = !inner.explanation_visible;
                Ok(inner.explanation_visible)
            }
            _ => Err(SessionError::no_data("no explanation image available")),
        }
    }

    /// Decode the explanation overlay and hand it to the blob sink.
    pub async fn export_explanation_image(&self) -> SessionResult<ExportedFile> {
        let explanation = self
            .lock()
            .slot
            .state()
            .result()
            .and_then(|result| result.explanation_image.clone())
            .ok_or_else(|| SessionError::no_data("no explanation image available"))?;

        let file = explanation_file(&explanation)?;
        self.blobs
            .write_file(&file.bytes, &file.file_name, &file.mime_type)
            .await?;
        Ok(file)
    }

    /// Copy a one-line summary of the result to the clipboard sink.
    pub async fn copy_summary(&self) -> SessionResult<String> {
        let text = self
            .lock()
            .slot
            .state()
            .result()
            .map(InferenceResult::summary_line)
            .ok_or_else(|| SessionError::no_data("no prediction to summarize"))?;

        self.clipboard.write_text(&text).await?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use esense_export::MemorySink;

    use crate::error::ErrorCategory;
    use crate::state::ABANDONED;
    use crate::test_support::{
        image, inference, network_down, with_explanation, ScriptedApi, ONE_PIXEL_PNG,
    };

    fn controller(api: Arc<ScriptedApi>) -> (SingleInferenceController, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let controller = SingleInferenceController::new(api, sink.clone(), sink.clone());
        (controller, sink)
    }

    async fn wait_until_submitting(controller: &SingleInferenceController) {
        while controller.phase() != Phase::Submitting {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_success_retains_fields_verbatim() {
        let api = Arc::new(ScriptedApi::new());
        api.push_single(Ok(inference("Deforested", 92.4)));
        let (controller, _) = controller(api.clone());

        controller.select(image("tile.jpg"));
        assert_eq!(controller.phase(), Phase::Selected);

        let outcome = controller.submit().await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Completed);

        let state = controller.state();
        let result = state.result().unwrap();
        assert_eq!(result.label, "Deforested");
        assert_eq!(result.confidence.value(), 92.4);
        assert_eq!(result.veg_fraction, Some(0.12));
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn test_submit_without_selection_is_validation_error() {
        let api = Arc::new(ScriptedApi::new());
        let (controller, _) = controller(api.clone());

        let err = controller.submit().await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(controller.phase(), Phase::Idle);
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_image_is_validation_error() {
        let api = Arc::new(ScriptedApi::new());
        let (controller, _) = controller(api.clone());

        controller.select(ImageHandle::new("empty.jpg", Vec::new()));
        let err = controller.submit().await.unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(controller.phase(), Phase::Selected);
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_clears_prior_result() {
        let api = Arc::new(ScriptedApi::new());
        api.push_single(Ok(inference("Deforested", 92.4)));
        api.push_single(Err(network_down()));
        let (controller, _) = controller(api.clone());

        controller.select(image("tile.jpg"));
        controller.submit().await.unwrap();
        assert_eq!(controller.phase(), Phase::Succeeded);

        controller.submit().await.unwrap();
        let state = controller.state();
        assert_eq!(state.phase(), Phase::Failed);
        assert!(state.result().is_none());
        assert_eq!(
            state.error(),
            Some(&SessionError::Transport("service unavailable".into()))
        );
    }

    #[tokio::test]
    async fn test_second_submit_while_in_flight_is_rejected() {
        let api = Arc::new(ScriptedApi::gated());
        api.push_single(Ok(inference("Deforested", 92.4)));
        let (controller, _) = controller(api.clone());
        controller.select(image("tile.jpg"));

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit().await }
        });
        wait_until_submitting(&controller).await;

        assert_eq!(controller.submit().await, Err(SessionError::InFlight));
        assert_eq!(controller.phase(), Phase::Submitting);

        api.release_one();
        assert_eq!(first.await.unwrap(), Ok(SubmitOutcome::Completed));
        assert_eq!(controller.phase(), Phase::Succeeded);
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn test_timed_out_submit_does_not_block_the_next_one() {
        let api = Arc::new(ScriptedApi::gated());
        api.push_single(Ok(inference("Deforested", 92.4)));
        let (controller, _) = controller(api.clone());
        controller.select(image("tile.jpg"));

        let timed_out =
            tokio::time::timeout(Duration::from_millis(50), controller.submit()).await;
        assert!(timed_out.is_err());

        let state = controller.state();
        assert_eq!(state.phase(), Phase::Failed);
        assert_eq!(
            state.error(),
            Some(&SessionError::Transport(ABANDONED.to_string()))
        );

        api.release_one();
        assert_eq!(controller.submit().await, Ok(SubmitOutcome::Completed));
        assert_eq!(controller.state().result().unwrap().label, "Deforested");
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn test_image_dimensions_follow_selection() {
        let api = Arc::new(ScriptedApi::new());
        let (controller, _) = controller(api);
        assert_eq!(controller.image_dimensions(), None);

        controller.select(ImageHandle::new("pixel.png", ONE_PIXEL_PNG.to_vec()));
        assert_eq!(
            controller.image_dimensions(),
            Some(ImageDimensions {
                width: 1,
                height: 1
            })
        );

        controller.select(image("opaque.bin"));
        assert_eq!(controller.image_dimensions(), None);

        controller.reset();
        assert_eq!(controller.image_dimensions(), None);
    }

    #[tokio::test]
    async fn test_reset_during_flight_discards_response() {
        let api = Arc::new(ScriptedApi::gated());
        api.push_single(Ok(inference("Deforested", 92.4)));
        let (controller, _) = controller(api.clone());
        controller.select(image("tile.jpg"));

        let pending = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit().await }
        });
        wait_until_submitting(&controller).await;

        controller.reset();
        api.release_one();

        assert_eq!(pending.await.unwrap(), Ok(SubmitOutcome::Superseded));
        assert_eq!(controller.state(), ControllerState::Idle);
    }

    #[tokio::test]
    async fn test_new_selection_during_flight_wins() {
        let api = Arc::new(ScriptedApi::gated());
        api.push_single(Ok(inference("Deforested", 92.4)));
        let (controller, _) = controller(api.clone());
        controller.select(image("old.jpg"));

        let pending = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit().await }
        });
        wait_until_submitting(&controller).await;

        controller.select(image("new.jpg"));
        api.release_one();

        assert_eq!(pending.await.unwrap(), Ok(SubmitOutcome::Superseded));
        let state = controller.state();
        assert_eq!(state.phase(), Phase::Selected);
        assert_eq!(state.selection().unwrap().filename(), "new.jpg");
    }

    #[tokio::test]
    async fn test_explanation_toggle_and_export() {
        let api = Arc::new(ScriptedApi::new());
        // "/9j/" is the base64 prefix of a JPEG SOI marker
        api.push_single(Ok(with_explanation(inference("Deforested", 92.4), "/9j/4A==")));
        let (controller, sink) = controller(api);
        controller.select(image("tile.jpg"));
        controller.submit().await.unwrap();

        assert!(controller.explanation_visible());
        assert_eq!(controller.toggle_explanation_visibility(), Ok(false));
        assert_eq!(controller.toggle_explanation_visibility(), Ok(true));

        let file = controller.export_explanation_image().await.unwrap();
        assert_eq!(file.bytes, vec![0xFF, 0xD8, 0xFF, 0xE0]);

        let written = sink.files();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].file_name, "gradcam.jpg");
        assert_eq!(written[0].mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_corrupt_explanation_is_decode_error() {
        let api = Arc::new(ScriptedApi::new());
        api.push_single(Ok(with_explanation(inference("Deforested", 92.4), "%%%")));
        let (controller, sink) = controller(api);
        controller.select(image("tile.jpg"));
        controller.submit().await.unwrap();

        let err = controller.export_explanation_image().await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Decode);
        assert!(sink.files().is_empty());
        assert_eq!(controller.phase(), Phase::Succeeded);
    }

    #[tokio::test]
    async fn test_explanation_operations_need_an_overlay() {
        let api = Arc::new(ScriptedApi::new());
        api.push_single(Ok(inference("Not Deforested", 71.0)));
        let (controller, sink) = controller(api);

        assert_eq!(
            controller.export_explanation_image().await.unwrap_err().category(),
            ErrorCategory::NoData
        );

        controller.select(image("tile.jpg"));
        controller.submit().await.unwrap();

        assert_eq!(
            controller.toggle_explanation_visibility().unwrap_err().category(),
            ErrorCategory::NoData
        );
        assert_eq!(
            controller.export_explanation_image().await.unwrap_err().category(),
            ErrorCategory::NoData
        );
        assert!(sink.files().is_empty());
    }

    #[tokio::test]
    async fn test_copy_summary() {
        let api = Arc::new(ScriptedApi::new());
        api.push_single(Ok(inference("Deforested", 92.4)));
        let (controller, sink) = controller(api);

        assert!(controller.copy_summary().await.is_err());

        controller.select(image("tile.jpg"));
        controller.submit().await.unwrap();
        let text = controller.copy_summary().await.unwrap();

        assert_eq!(
            text,
            "Prediction: Deforested (92.4%) - Vegetation Coverage: 12.0%"
        );
        assert_eq!(sink.clipboard(), vec![text]);
    }
}
