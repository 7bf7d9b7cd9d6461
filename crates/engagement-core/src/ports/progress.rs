//! Progress reporting port for UI integration.

use crate::domain::EngagementClass;

/// Events emitted while classifying a sequence of images.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Classification started for an image.
    Started {
        /// Path to the image.
        path: String,
        /// Index in the run (0-based).
        index: usize,
        /// Total images in the run, if known.
        total: Option<usize>,
    },
    /// An image was classified.
    Classified {
        /// Path to the image.
        path: String,
        /// Predicted class.
        class: EngagementClass,
        /// Engagement score.
        score: f64,
    },
    /// An image could not be read or classified.
    Failed {
        /// Path to the image.
        path: String,
        /// Failure reason.
        reason: String,
    },
    /// All images have been handled.
    Finished {
        /// Images classified.
        classified: usize,
        /// Images that failed.
        failed: usize,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}
