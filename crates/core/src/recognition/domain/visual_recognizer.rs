use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::recognition::domain::response::{ClassificationResponse, FaceDetectionResponse};
use crate::shared::error::ApplicationError;

#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("the service rejected the credentials (HTTP {status})")]
    Auth { status: u16 },
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("service error (HTTP {status}): {detail}")]
    Service { status: u16, detail: String },
    #[error("unreadable service response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RecognitionError> for ApplicationError {
    fn from(err: RecognitionError) -> Self {
        match err {
            RecognitionError::Auth { .. } => ApplicationError::InvalidCredentials,
            other => ApplicationError::ServiceError(other.to_string()),
        }
    }
}

/// Port to a remote image recognition service.
///
/// `Ok(None)` means the request went through but the service returned no
/// result body; callers must keep that apart from transport and auth failures.
/// One call per method per capture; overlapping calls are the caller's concern.
#[async_trait]
pub trait VisualRecognizer: Send + Sync {
    async fn classify(
        &self,
        image: &Path,
    ) -> Result<Option<ClassificationResponse>, RecognitionError>;

    async fn detect_faces(
        &self,
        image: &Path,
    ) -> Result<Option<FaceDetectionResponse>, RecognitionError>;
}
