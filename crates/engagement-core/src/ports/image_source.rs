//! Image source port for loading encoded images.

use crate::domain::EncodedImage;

/// Port for reading encoded images from a source.
pub trait ImageSource: Send + Sync {
    /// Returns an iterator over images from this source.
    ///
    /// # Errors
    ///
    /// Individual items may be errors if an image cannot be read.
    fn images(&self) -> Box<dyn Iterator<Item = anyhow::Result<EncodedImage>> + Send + '_>;

    /// Returns the total number of images, if known.
    fn count_hint(&self) -> Option<usize>;
}
