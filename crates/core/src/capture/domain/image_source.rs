use crate::shared::error::ApplicationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Camera,
    PhotoLibrary,
}

impl SourceKind {
    pub fn unavailable(self) -> ApplicationError {
        match self {
            SourceKind::Camera => ApplicationError::CameraUnavailable,
            SourceKind::PhotoLibrary => ApplicationError::PhotoLibraryUnavailable,
        }
    }
}

/// Outcome of asking the user for a photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition {
    Image(Vec<u8>),
    /// The user backed out; nothing should change.
    Cancelled,
}

/// Where photos come from (camera, photo library).
pub trait ImageSource: Send {
    fn kind(&self) -> SourceKind;

    /// Returns encoded image bytes, or `Cancelled` if the user backed out.
    /// Fails with the kind's "unavailable" error when the source is absent.
    fn acquire(&mut self) -> Result<Acquisition, ApplicationError>;
}
