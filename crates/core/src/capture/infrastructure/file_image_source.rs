use std::io::Cursor;
use std::path::PathBuf;

use image::codecs::jpeg::JpegEncoder;

use crate::capture::domain::image_source::{Acquisition, ImageSource, SourceKind};
use crate::shared::error::ApplicationError;

/// Photo-library source backed by the filesystem.
///
/// `None` models the user dismissing the picker. The picked file is decoded
/// with the `image` crate and re-encoded as full-quality JPEG, so the service
/// always receives a format it accepts.
pub struct FileImageSource {
    selection: Option<PathBuf>,
}

impl FileImageSource {
    pub fn new(selection: Option<PathBuf>) -> Self {
        Self { selection }
    }
}

impl ImageSource for FileImageSource {
    fn kind(&self) -> SourceKind {
        SourceKind::PhotoLibrary
    }

    fn acquire(&mut self) -> Result<Acquisition, ApplicationError> {
        let Some(path) = self.selection.take() else {
            return Ok(Acquisition::Cancelled);
        };

        let img = image::open(&path).map_err(|e| {
            log::error!("Cannot load {}: {e}", path.display());
            self.kind().unavailable()
        })?;

        encode_jpeg(&img).map(Acquisition::Image).map_err(|e| {
            log::error!("Cannot re-encode {}: {e}", path.display());
            self.kind().unavailable()
        })
    }
}

fn encode_jpeg(img: &image::DynamicImage) -> image::ImageResult<Vec<u8>> {
    let rgb = img.to_rgb8();
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, 100).encode_image(&rgb)?;
    Ok(buf.into_inner())
}
