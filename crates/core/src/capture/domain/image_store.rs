use std::path::PathBuf;

/// Transient storage for the most recent capture.
///
/// Single slot: each call overwrites the previous image and returns the same
/// location, which the recognizer then reads.
pub trait ImageStore: Send + Sync {
    fn persist(&self, bytes: &[u8]) -> std::io::Result<PathBuf>;
}
