//! Core domain types for engagement classification.

mod class;
mod prediction;
mod source;
mod tensor;

pub use class::{EngagementClass, CLASS_COUNT, CLASS_NAMES, ENGAGEMENT_WEIGHTS};
pub use prediction::{ClassProbabilities, ClassificationOutcome, Prediction};
pub use source::{EncodedImage, FileResult};
pub use tensor::{ImageTensor, CHANNELS, IMAGE_SIZE, INPUT_SHAPE};
