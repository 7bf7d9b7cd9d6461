//! Shared service state.

use std::sync::Arc;

use engagement_core::Classifier;

use super::error::ApiError;

/// State shared across handlers.
///
/// The classifier is loaded once before the router is built and never
/// mutated afterwards, so handlers only ever clone the `Arc`.
#[derive(Clone)]
pub struct ServiceState {
    classifier: Option<Arc<dyn Classifier>>,
}

impl ServiceState {
    /// State serving the given classifier.
    #[must_use]
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier: Some(classifier),
        }
    }

    /// Degraded state: health checks work, everything else reports
    /// `Model not loaded`.
    #[must_use]
    pub const fn without_model() -> Self {
        Self { classifier: None }
    }

    /// Whether a classifier is available.
    #[must_use]
    pub const fn model_loaded(&self) -> bool {
        self.classifier.is_some()
    }

    /// Returns the classifier or [`ApiError::ModelNotLoaded`].
    ///
    /// # Errors
    ///
    /// Fails in degraded mode.
    pub fn classifier(&self) -> Result<Arc<dyn Classifier>, ApiError> {
        self.classifier.clone().ok_or(ApiError::ModelNotLoaded)
    }
}
