//! Encoded images read from an image source, and per-file results.

use serde::Serialize;

use super::ClassificationOutcome;

/// Undecoded image bytes plus where they came from.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// Origin of the bytes (a file path for filesystem sources).
    pub path: String,
    /// Encoded image container (JPEG, PNG, ...).
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    /// Creates an encoded image.
    #[must_use]
    pub fn new(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes,
        }
    }
}

/// Classification result for one image file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    /// Path of the classified file.
    pub path: String,
    /// Prediction or error.
    #[serde(flatten)]
    pub outcome: ClassificationOutcome,
}
