//! Classifier port: the forward pass behind a trait.

use crate::domain::{ClassProbabilities, ImageTensor};

/// A frozen image classifier producing one probability per engagement class.
///
/// Implementations must be safe to call concurrently from several threads;
/// the HTTP service shares a single instance across all requests.
pub trait Classifier: Send + Sync {
    /// Per-item input shape the model expects, `(height, width, channels)`.
    fn input_shape(&self) -> [usize; 3];

    /// Runs one forward pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime fails or the output has the wrong length.
    fn predict(&self, input: &ImageTensor) -> anyhow::Result<ClassProbabilities>;
}
