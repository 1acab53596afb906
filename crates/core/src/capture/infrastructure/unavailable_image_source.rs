use crate::capture::domain::image_source::{Acquisition, ImageSource, SourceKind};
use crate::shared::error::ApplicationError;

/// Stands in for a source the host does not have, e.g. a camera on a server.
pub struct UnavailableImageSource {
    kind: SourceKind,
}

impl UnavailableImageSource {
    pub fn new(kind: SourceKind) -> Self {
        Self { kind }
    }
}

impl ImageSource for UnavailableImageSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn acquire(&mut self) -> Result<Acquisition, ApplicationError> {
        Err(self.kind.unavailable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_reports_camera_unavailable() {
        let mut source = UnavailableImageSource::new(SourceKind::Camera);
        assert_eq!(source.acquire(), Err(ApplicationError::CameraUnavailable));
    }

    #[test]
    fn test_library_reports_library_unavailable() {
        let mut source = UnavailableImageSource::new(SourceKind::PhotoLibrary);
        assert_eq!(source.acquire(), Err(ApplicationError::PhotoLibraryUnavailable));
    }
}
