//! Scripted inference backend for controller tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use esense_client::{ClientError, ClientResult, InferenceApi};
use esense_models::{
    BatchItem, BatchResult, BatchResultRow, BatchSummary, ExplanationImage, FractionConfidence,
    ImageHandle, InferenceResult, PercentConfidence,
};

/// Replays queued responses; optionally holds each call until released.
#[derive(Default)]
pub(crate) struct ScriptedApi {
    single: Mutex<VecDeque<ClientResult<InferenceResult>>>,
    batch: Mutex<VecDeque<ClientResult<BatchResult>>>,
    calls: AtomicUsize,
    gated: AtomicBool,
    release: Notify,
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Hold every call until [`ScriptedApi::release_one`].
    pub(crate) fn gated() -> Self {
        let api = Self::default();
        api.gated.store(true, Ordering::SeqCst);
        api
    }

    pub(crate) fn push_single(&self, response: ClientResult<InferenceResult>) {
        self.single.lock().unwrap().push_back(response);
    }

    pub(crate) fn push_batch(&self, response: ClientResult<BatchResult>) {
        self.batch.lock().unwrap().push_back(response);
    }

    pub(crate) fn release_one(&self) {
        self.release.notify_one();
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.gated.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
    }
}

#[async_trait]
impl InferenceApi for ScriptedApi {
    async fn submit_single(&self, _image: &ImageHandle) -> ClientResult<InferenceResult> {
        self.enter().await;
        self.single
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::invalid_response("no scripted response")))
    }

    async fn submit_batch(&self, _images: &[ImageHandle]) -> ClientResult<BatchResult> {
        self.enter().await;
        self.batch
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::invalid_response("no scripted response")))
    }

    async fn check_health(&self) -> bool {
        true
    }
}

/// A complete 1x1 RGB PNG.
pub(crate) const ONE_PIXEL_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
    0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x08, 0xD7, 0x63, 0xF8,
    0xCF, 0xC0, 0x00, 0x00, 0x03, 0x01, 0x01, 0x00, 0x18, 0xDD, 0x8D, 0xB0, 0x00, 0x00, 0x00,
    0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

pub(crate) fn image(name: &str) -> ImageHandle {
    ImageHandle::new(name, b"tile bytes".to_vec())
}

pub(crate) fn inference(label: &str, confidence: f64) -> InferenceResult {
    InferenceResult {
        label: label.to_string(),
        confidence: PercentConfidence::new(confidence).unwrap(),
        prob_deforested: None,
        prob_non_deforested: None,
        veg_fraction: Some(0.12),
        veg_norm: None,
        explanation_image: None,
    }
}

pub(crate) fn with_explanation(mut result: InferenceResult, base64: &str) -> InferenceResult {
    result.explanation_image = Some(ExplanationImage::from_base64(base64));
    result
}

pub(crate) fn batch(summary: (u32, u32, u32), labels: &[(&str, &str)]) -> BatchResult {
    BatchResult {
        summary: BatchSummary {
            total: summary.0,
            deforested: summary.1,
            not_deforested: summary.2,
        },
        items: labels
            .iter()
            .map(|(filename, label)| {
                BatchItem::Classified(BatchResultRow {
                    filename: filename.to_string(),
                    label: label.to_string(),
                    confidence: FractionConfidence::new(0.9).unwrap(),
                    prob_deforested: None,
                    prob_non_deforested: None,
                    veg_fraction: None,
                })
            })
            .collect(),
    }
}

pub(crate) fn network_down() -> ClientError {
    ClientError::Status {
        status: 503,
        message: "service unavailable".to_string(),
    }
}
