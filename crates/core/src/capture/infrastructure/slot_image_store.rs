use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::capture::domain::image_store::ImageStore;
use crate::shared::constants::CAPTURE_SLOT_NAME;

/// Single-file image store: every capture overwrites `capture.jpg`.
///
/// Writes go to a `.part` file that is renamed into place, so a reader never
/// sees a half-written image.
pub struct SlotImageStore {
    dir: PathBuf,
    // Keeps the directory alive when the store owns it.
    _temp_dir: Option<TempDir>,
}

impl SlotImageStore {
    /// Store backed by a fresh temporary directory, removed on drop.
    pub fn temporary() -> std::io::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        Ok(Self {
            dir: temp_dir.path().to_path_buf(),
            _temp_dir: Some(temp_dir),
        })
    }

    /// Store writing into an existing or to-be-created directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            _temp_dir: None,
        }
    }

    pub fn slot_path(&self) -> PathBuf {
        self.dir.join(CAPTURE_SLOT_NAME)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ImageStore for SlotImageStore {
    fn persist(&self, bytes: &[u8]) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let dest = self.slot_path();
        let temp_path = dest.with_extension("part");
        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &dest)?;
        Ok(dest)
    }
}
