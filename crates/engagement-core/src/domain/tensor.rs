//! Normalized model input.

/// Model input height and width in pixels.
pub const IMAGE_SIZE: u32 = 224;

/// Channels per pixel (RGB).
pub const CHANNELS: usize = 3;

/// Shape of a single input item: `(height, width, channels)`.
pub const INPUT_SHAPE: [usize; 3] = [IMAGE_SIZE as usize, IMAGE_SIZE as usize, CHANNELS];

/// A single-item batch of RGB pixels in `[0, 1]`, laid out NHWC.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    data: Vec<f32>,
    height: usize,
    width: usize,
}

impl ImageTensor {
    /// Wraps interleaved RGB values of a `height x width` image.
    ///
    /// Returns `None` if `data` does not hold exactly `height * width * 3` values.
    #[must_use]
    pub fn from_rgb(data: Vec<f32>, height: usize, width: usize) -> Option<Self> {
        (data.len() == height * width * CHANNELS).then_some(Self {
            data,
            height,
            width,
        })
    }

    /// `(batch, height, width, channels)`; batch is always 1.
    #[must_use]
    pub const fn shape(&self) -> [usize; 4] {
        [1, self.height, self.width, CHANNELS]
    }

    /// Flat values in NHWC order.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Value at pixel `(y, x)` channel `c`.
    #[must_use]
    pub fn get(&self, y: usize, x: usize, c: usize) -> Option<f32> {
        if y >= self.height || x >= self.width || c >= CHANNELS {
            return None;
        }
        self.data.get((y * self.width + x) * CHANNELS + c).copied()
    }
}
