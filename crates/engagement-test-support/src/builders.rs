//! Synthetic image and model builders for testing.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::prelude::{Engine, BASE64_STANDARD};
use engagement_core::domain::EncodedImage;
use engagement_core::inference::parameter_shapes;
use image::{
    DynamicImage, GrayAlphaImage, GrayImage, ImageFormat, Luma, LumaA, Rgb, RgbImage, Rgba,
    RgbaImage,
};
use safetensors::tensor::TensorView;

/// Builder for creating synthetic test images.
///
/// Produces decoded images in the color modes the preprocessor must accept,
/// plus helpers to encode them the way clients send them.
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    // === Color Modes ===

    /// Creates a uniform RGB image.
    #[must_use]
    pub fn solid_rgb(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    /// Creates a uniform grayscale image.
    #[must_use]
    pub fn grayscale(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([value])))
    }

    /// Creates a uniform grayscale image with alpha.
    #[must_use]
    pub fn grayscale_alpha(width: u32, height: u32, value: u8, alpha: u8) -> DynamicImage {
        DynamicImage::ImageLumaA8(GrayAlphaImage::from_pixel(
            width,
            height,
            LumaA([value, alpha]),
        ))
    }

    /// Creates a uniform RGBA image.
    #[must_use]
    pub fn solid_rgba(width: u32, height: u32, color: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color)))
    }

    /// Creates a high-contrast checkerboard.
    #[must_use]
    pub fn checkerboard(width: u32, height: u32, cell_size: u32) -> DynamicImage {
        let cell = cell_size.max(1);
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        }))
    }

    // === Encoding ===

    /// Encodes an image in the given container format.
    ///
    /// # Panics
    ///
    /// Panics if the format cannot represent the image's color mode.
    #[must_use]
    pub fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image
            .write_to(&mut buf, format)
            .unwrap_or_else(|e| panic!("failed to encode {format:?}: {e}"));
        buf.into_inner()
    }

    /// Encodes as PNG.
    #[must_use]
    pub fn png(image: &DynamicImage) -> Vec<u8> {
        Self::encode(image, ImageFormat::Png)
    }

    /// Encodes as JPEG.
    #[must_use]
    pub fn jpeg(image: &DynamicImage) -> Vec<u8> {
        Self::encode(image, ImageFormat::Jpeg)
    }

    /// Encodes as PNG and then standard base64, as API clients do.
    #[must_use]
    pub fn png_base64(image: &DynamicImage) -> String {
        to_base64(&Self::png(image))
    }

    /// A 224x224 blue JPEG in base64, the canonical sample request image.
    #[must_use]
    pub fn sample_base64() -> String {
        to_base64(&Self::jpeg(&Self::solid_rgb(224, 224, [0, 0, 255])))
    }

    /// Wraps PNG bytes as an encoded image with a synthetic path.
    #[must_use]
    pub fn encoded(name: &str, image: &DynamicImage) -> EncodedImage {
        EncodedImage::new(format!("synthetic://{name}"), Self::png(image))
    }
}

/// Standard base64 with padding.
#[must_use]
pub fn to_base64(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes)
}

/// Writes a safetensors model whose every weight is zero.
///
/// A zero model outputs a uniform distribution, so every prediction is
/// `Actively Looking` (lowest index wins ties) with an engagement score of 0.45.
///
/// # Panics
///
/// Panics if the file cannot be written.
pub fn write_zero_model(path: impl AsRef<Path>) -> PathBuf {
    let shapes = parameter_shapes();
    let buffers: Vec<(String, Vec<usize>, Vec<u8>)> = shapes
        .into_iter()
        .map(|(name, shape)| {
            let len: usize = shape.iter().product();
            (name, shape, vec![0u8; len * std::mem::size_of::<f32>()])
        })
        .collect();

    let views: HashMap<String, TensorView<'_>> = buffers
        .iter()
        .map(|(name, shape, data)| {
            let view = TensorView::new(safetensors::Dtype::F32, shape.clone(), data)
                .unwrap_or_else(|e| panic!("invalid tensor view {name}: {e}"));
            (name.clone(), view)
        })
        .collect();

    let serialized = safetensors::serialize(&views, &None)
        .unwrap_or_else(|e| panic!("failed to serialize model: {e}"));

    let path = path.as_ref().to_path_buf();
    std::fs::write(&path, serialized)
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
    path
}
