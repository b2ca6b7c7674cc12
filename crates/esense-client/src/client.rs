//! Inference service HTTP client.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use esense_models::{BatchResult, ImageHandle, InferenceResult};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::types::{BatchPredictResponse, HealthResponse, PredictResponse, ServiceErrorBody};

/// Multipart field carrying the image of a single prediction.
pub const SINGLE_IMAGE_FIELD: &str = "image";
/// Multipart field repeated once per image of a batch prediction.
pub const BATCH_IMAGE_FIELD: &str = "images";

/// Operations offered by the remote inference service.
///
/// Each call issues exactly one request and never retries; retrying is the
/// caller's decision.
#[async_trait]
pub trait InferenceApi: Send + Sync {
    /// Classify one image.
    async fn submit_single(&self, image: &ImageHandle) -> ClientResult<InferenceResult>;

    /// Classify several images in one request. Response order is preserved.
    async fn submit_batch(&self, images: &[ImageHandle]) -> ClientResult<BatchResult>;

    /// `true` only when the service explicitly reports itself healthy.
    async fn check_health(&self) -> bool;
}

/// reqwest-backed [`InferenceApi`].
pub struct InferenceClient {
    http: Client,
    config: ClientConfig,
}

impl InferenceClient {
    /// Create a new inference client.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self { http, config })
    }

    async fn post_form<T: DeserializeOwned>(&self, path: &str, form: Form) -> ClientResult<T> {
        let url = self.config.endpoint(path);
        debug!("Sending multipart request to {}", url);

        let response = self.http.post(&url).multipart(form).send().await?;
        decode_response(response).await
    }
}

#[async_trait]
impl InferenceApi for InferenceClient {
    async fn submit_single(&self, image: &ImageHandle) -> ClientResult<InferenceResult> {
        if image.is_empty() {
            return Err(ClientError::invalid_request(format!(
                "image '{}' has no content",
                image.filename()
            )));
        }

        let form = Form::new().part(SINGLE_IMAGE_FIELD, image_part(image)?);
        let body: PredictResponse = self.post_form("predict", form).await?;
        InferenceResult::try_from(body)
    }

    async fn submit_batch(&self, images: &[ImageHandle]) -> ClientResult<BatchResult> {
        let mut form = Form::new();
        for image in images {
            form = form.part(BATCH_IMAGE_FIELD, image_part(image)?);
        }

        let body: BatchPredictResponse = self.post_form("batch_predict", form).await?;
        BatchResult::try_from(body)
    }

    async fn check_health(&self) -> bool {
        let url = self.config.endpoint("ping");

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<HealthResponse>().await {
                    Ok(health) => health.status == "ok",
                    Err(e) => {
                        warn!("Inference service health payload unreadable: {}", e);
                        false
                    }
                }
            }
            Ok(response) => {
                warn!("Inference service health check failed: {}", response.status());
                false
            }
            Err(e) => {
                warn!("Inference service health check error: {}", e);
                false
            }
        }
    }
}

fn image_part(image: &ImageHandle) -> ClientResult<Part> {
    file_part(image.content(), image.filename(), image.content_type())
}

/// A bad content type is a local problem, reported before anything is sent.
fn file_part(content: &[u8], filename: &str, content_type: &str) -> ClientResult<Part> {
    Part::bytes(content.to_vec())
        .file_name(filename.to_string())
        .mime_str(content_type)
        .map_err(|e| {
            ClientError::invalid_request(format!(
                "invalid content type '{}' for '{}': {}",
                content_type, filename, e
            ))
        })
}

/// Turn a response into `T`, keeping transport and decode failures apart.
async fn decode_response<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Status {
            status: status.as_u16(),
            message: service_message(status, &body),
        });
    }

    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Prefer the service's own error text; fall back to a generic message.
fn service_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ServiceErrorBody>(body) {
        return parsed.message();
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("service returned {}", status)
    } else {
        trimmed.to_string()
    }
}
