use std::path::Path;

use async_trait::async_trait;
use reqwest::header::ACCEPT_LANGUAGE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::service_config::ServiceConfig;
use crate::recognition::domain::response::{ClassificationResponse, FaceDetectionResponse};
use crate::recognition::domain::visual_recognizer::{RecognitionError, VisualRecognizer};
use crate::shared::constants::CAPTURE_SLOT_NAME;

/// Visual Recognition v3 client.
///
/// Uploads the image as multipart `images_file` and authenticates with HTTP
/// basic auth (`apikey` / key). Every request is bounded by `config.timeout`.
pub struct WatsonVisualRecognizer {
    client: Client,
    config: ServiceConfig,
}

impl WatsonVisualRecognizer {
    pub fn new(config: ServiceConfig) -> Result<Self, RecognitionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(RecognitionError::Transport)?;
        Ok(Self { client, config })
    }

    async fn post_image<T: DeserializeOwned + Send>(
        &self,
        endpoint: &str,
        image: &Path,
        send_locale: bool,
    ) -> Result<Option<T>, RecognitionError> {
        let bytes = tokio::fs::read(image).await?;
        let file_name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| CAPTURE_SLOT_NAME.to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_for(image))
            .map_err(RecognitionError::Transport)?;

        let url = self.config.endpoint(endpoint);
        log::debug!("POST {url} ({})", image.display());

        let mut request = self
            .client
            .post(&url)
            .query(&[("version", self.config.version.as_str())])
            .basic_auth("apikey", Some(&self.config.api_key))
            .multipart(Form::new().part("images_file", part));
        if send_locale {
            request = request.header(ACCEPT_LANGUAGE, self.config.locale.as_str());
        }

        let response = request.send().await.map_err(RecognitionError::Transport)?;
        let status = response.status();
        let body = response.text().await.map_err(RecognitionError::Transport)?;
        parse_body(status, &body)
    }
}

#[async_trait]
impl VisualRecognizer for WatsonVisualRecognizer {
    async fn classify(
        &self,
        image: &Path,
    ) -> Result<Option<ClassificationResponse>, RecognitionError> {
        self.post_image("classify", image, true).await
    }

    async fn detect_faces(
        &self,
        image: &Path,
    ) -> Result<Option<FaceDetectionResponse>, RecognitionError> {
        self.post_image("detect_faces", image, false).await
    }
}

fn mime_for(image: &Path) -> &'static str {
    let ext = image
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("tif" | "tiff") => "image/tiff",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Splits a response into auth failure, service failure, "no data", or a result.
fn parse_body<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<Option<T>, RecognitionError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(RecognitionError::Auth {
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        return Err(RecognitionError::Service {
            status: status.as_u16(),
            detail: error_detail(status, body),
        });
    }
    if body.trim().is_empty() {
        return Ok(None);
    }

    let value: serde_json::Value = serde_json::from_str(body).map_err(RecognitionError::Decode)?;
    if value.get("images").map_or(true, serde_json::Value::is_null) {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(RecognitionError::Decode)
}

/// Pulls the human-readable message out of a service error body.
///
/// The service uses `{"error": "..."}`, `{"error": {"description": ...}}`
/// or `{"description": "..."}` depending on the endpoint and failure.
fn error_detail(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            let error = value.get("error");
            error
                .and_then(|e| e.as_str())
                .or_else(|| error.and_then(|e| e.get("description")).and_then(|d| d.as_str()))
                .or_else(|| value.get("description").and_then(|d| d.as_str()))
                .map(str::to_string)
        });

    match from_json {
        Some(detail) => detail,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    }
}
