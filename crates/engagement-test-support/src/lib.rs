//! Test support utilities for engagement crates.
//!
//! Provides mocks, synthetic image builders, and a zero-weight model
//! artifact for testing the classification pipeline and HTTP service.
//!
//! # Example
//!
//! ```
//! use engagement_core::EngagementClass;
//! use engagement_test_support::{MockClassifier, SyntheticImageBuilder};
//!
//! // Create a client-style base64 payload
//! let payload = SyntheticImageBuilder::png_base64(&SyntheticImageBuilder::grayscale(64, 64, 90));
//!
//! // Create a classifier that always predicts one class
//! let classifier = MockClassifier::certain(EngagementClass::Bored);
//! # let _ = (payload, classifier);
//! ```

mod builders;
mod mocks;

pub use builders::{to_base64, write_zero_model, SyntheticImageBuilder};
pub use mocks::{
    FailingClassifier, MockClassifier, MockImageSource, MockProgressSink, MockResultOutput,
    PanickingClassifier,
};
