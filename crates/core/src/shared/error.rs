use thiserror::Error;

/// User-facing failure of a capture attempt.
///
/// Every variant ends the current attempt; nothing is retried. The
/// presentation layer shows `title()` and `message()` in a modal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("{}: {}", self.title(), self.message())]
    MissingCredentials,
    #[error("{}: {}", self.title(), self.message())]
    InvalidCredentials,
    #[error("{}: {}", self.title(), self.message())]
    CameraUnavailable,
    #[error("{}: {}", self.title(), self.message())]
    PhotoLibraryUnavailable,
    #[error("{}: {}", self.title(), self.message())]
    EmptyResult,
    #[error("{}: {}", self.title(), self.message())]
    ServiceError(String),
    #[error("{}: {}", self.title(), self.message())]
    CaptureInProgress,
}

impl ApplicationError {
    pub fn title(&self) -> &str {
        match self {
            Self::MissingCredentials => "Missing Visual Recognition Credentials",
            Self::InvalidCredentials => "Invalid Visual Recognition Credentials",
            Self::CameraUnavailable => "Camera Unavailable",
            Self::PhotoLibraryUnavailable => "Photo Library Unavailable",
            Self::EmptyResult => "No Results",
            Self::ServiceError(_) => "Visual Recognition Failed",
            Self::CaptureInProgress => "Analysis In Progress",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::MissingCredentials | Self::InvalidCredentials => {
                "Please check the readme to ensure proper credentials configuration."
            }
            Self::CameraUnavailable => {
                "The camera feature is currently unavailable on this device. \
                 Please use a device with a camera or choose a photo from the library."
            }
            Self::PhotoLibraryUnavailable => {
                "The Photo Library feature is currently unavailable on this device. \
                 Please try again."
            }
            Self::EmptyResult => {
                "The service did not return any classification data for this photo."
            }
            Self::ServiceError(detail) => detail,
            Self::CaptureInProgress => {
                "A photo is already being analyzed. Wait for it to finish or cancel it first."
            }
        }
    }
}
