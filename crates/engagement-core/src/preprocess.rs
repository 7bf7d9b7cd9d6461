//! Image preprocessing: encoded bytes to a normalized model input.
//!
//! Steps, in order:
//! 1. Decode the container (any format the `image` crate reads)
//! 2. Flatten to 8-bit RGB (palette, grayscale and alpha inputs are converted, alpha is dropped)
//! 3. Resize to exactly 224x224 without preserving aspect ratio
//! 4. Scale pixel values to `[0, 1]` by dividing by 255
//! 5. Wrap as a single-item batch `(1, 224, 224, 3)`

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use thiserror::Error;
use tracing::trace;

use crate::domain::{ImageTensor, IMAGE_SIZE};

/// Resampling filter used for the resize step (bicubic).
const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// The payload could not be turned into a model input.
///
/// Always a client fault: the message describes the payload, never server internals.
#[derive(Debug, Error)]
pub enum ImagePreprocessingError {
    /// The payload or decoded image holds no pixels.
    #[error("Image preprocessing failed: empty image")]
    Empty,
    /// The transport encoding around the image (e.g. base64) was invalid.
    #[error("Image preprocessing failed: {0}")]
    Encoding(String),
    /// The bytes are not a supported or intact image container.
    #[error("Image preprocessing failed: {0}")]
    Decode(#[from] image::ImageError),
}

impl ImagePreprocessingError {
    /// Wraps a transport-level decoding failure.
    #[must_use]
    pub fn encoding(cause: impl std::fmt::Display) -> Self {
        Self::Encoding(cause.to_string())
    }
}

/// Decodes and normalizes encoded image bytes.
///
/// # Errors
///
/// Returns an error if the bytes are empty, corrupt, or in an unsupported format.
pub fn preprocess_image(bytes: &[u8]) -> Result<ImageTensor, ImagePreprocessingError> {
    if bytes.is_empty() {
        return Err(ImagePreprocessingError::Empty);
    }
    let image = image::load_from_memory(bytes)?;
    trace!(
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        "Decoded image"
    );
    normalize(&image)
}

/// Normalizes an already decoded image.
///
/// # Errors
///
/// Returns an error if the image has zero width or height.
pub fn normalize(image: &DynamicImage) -> Result<ImageTensor, ImagePreprocessingError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ImagePreprocessingError::Empty);
    }

    let rgb = match image {
        DynamicImage::ImageRgb8(rgb) => rgb.clone(),
        other => other.to_rgb8(),
    };
    let resized: RgbImage = imageops::resize(&rgb, IMAGE_SIZE, IMAGE_SIZE, RESIZE_FILTER);

    let data: Vec<f32> = resized
        .as_raw()
        .iter()
        .map(|v| f32::from(*v) / 255.0)
        .collect();

    let side = IMAGE_SIZE as usize;
    ImageTensor::from_rgb(data, side, side).ok_or(ImagePreprocessingError::Empty)
}
