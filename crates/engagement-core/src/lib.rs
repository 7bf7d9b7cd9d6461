//! Engagement Core - Domain logic for student engagement classification
//!
//! This crate contains the engagement class labels and weights, the image
//! preprocessor, the engagement scorer, the CNN classifier and the port
//! traits adapters implement.

pub mod domain;
pub mod inference;
pub mod pipeline;
pub mod ports;
pub mod preprocess;
pub mod scoring;

pub use domain::{
    ClassProbabilities, ClassificationOutcome, EncodedImage, EngagementClass, FileResult,
    ImageTensor, Prediction, CLASS_NAMES, IMAGE_SIZE, INPUT_SHAPE,
};
pub use inference::{load_model, select_device, DevicePreference, EngagementNet, ModelLoadError};
pub use pipeline::{classify_bytes, classify_source, ClassifyError, RunSummary};
pub use ports::{Classifier, ImageSource, ProgressEvent, ProgressSink, ResultOutput};
pub use preprocess::{preprocess_image, ImagePreprocessingError};
pub use scoring::engagement_score;
