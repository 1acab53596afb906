use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::recognition::domain::response::{ClassificationResponse, FaceDetectionResponse};
use crate::recognition::domain::visual_recognizer::{RecognitionError, VisualRecognizer};

pub const CLASSIFY_RECORDING: &str = "classify.json";
pub const DETECT_FACES_RECORDING: &str = "detect_faces.json";

/// Replays responses previously saved from the service.
///
/// Reads `classify.json` and `detect_faces.json` from a directory on every
/// call. A missing recording counts as "no data", matching an empty body from
/// the live service. The image itself must still exist.
pub struct RecordedVisualRecognizer {
    dir: PathBuf,
}

impl RecordedVisualRecognizer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn replay<T: DeserializeOwned + Send>(
        &self,
        name: &str,
        image: &Path,
    ) -> Result<Option<T>, RecognitionError> {
        tokio::fs::metadata(image).await?;

        let path = self.dir.join(name);
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No recording at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let value: Option<T> = serde_json::from_str(&json).map_err(RecognitionError::Decode)?;
        Ok(value)
    }
}

#[async_trait]
impl VisualRecognizer for RecordedVisualRecognizer {
    async fn classify(
        &self,
        image: &Path,
    ) -> Result<Option<ClassificationResponse>, RecognitionError> {
        self.replay(CLASSIFY_RECORDING, image).await
    }

    async fn detect_faces(
        &self,
        image: &Path,
    ) -> Result<Option<FaceDetectionResponse>, RecognitionError> {
        self.replay(DETECT_FACES_RECORDING, image).await
    }
}
