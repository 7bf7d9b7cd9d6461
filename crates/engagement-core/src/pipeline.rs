//! Classification pipeline: preprocess, forward pass, argmax, score.

use thiserror::Error;
use tracing::debug;

use crate::domain::{ClassificationOutcome, EncodedImage, FileResult, ImageTensor, Prediction};
use crate::ports::{Classifier, ImageSource, ProgressEvent, ProgressSink, ResultOutput};
use crate::preprocess::{preprocess_image, ImagePreprocessingError};

/// Failure while classifying one image.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The payload is not a usable image (client fault).
    #[error(transparent)]
    Preprocessing(#[from] ImagePreprocessingError),
    /// The forward pass failed (server fault).
    #[error("inference failed: {0:#}")]
    Inference(anyhow::Error),
}

impl ClassifyError {
    /// Returns true if the caller supplied a bad image.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Preprocessing(_))
    }
}

/// Classifies encoded image bytes.
///
/// # Errors
///
/// Returns [`ClassifyError::Preprocessing`] for undecodable input and
/// [`ClassifyError::Inference`] if the classifier fails.
pub fn classify_bytes(
    classifier: &dyn Classifier,
    bytes: &[u8],
) -> Result<Prediction, ClassifyError> {
    let tensor = preprocess_image(bytes)?;
    classify_tensor(classifier, &tensor)
}

/// Classifies an already normalized tensor.
///
/// # Errors
///
/// Returns [`ClassifyError::Inference`] if the classifier fails.
pub fn classify_tensor(
    classifier: &dyn Classifier,
    tensor: &ImageTensor,
) -> Result<Prediction, ClassifyError> {
    let probabilities = classifier
        .predict(tensor)
        .map_err(ClassifyError::Inference)?;
    let prediction = Prediction::from_probabilities(probabilities);
    debug!(
        class = %prediction.predicted_class,
        confidence = prediction.confidence,
        score = prediction.engagement_score,
        "Classified image"
    );
    Ok(prediction)
}

/// Totals for a run over an image source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Images classified.
    pub classified: usize,
    /// Images that could not be read or classified.
    pub failed: usize,
}

/// Classifies every image of `source` in order, writing one result per image.
///
/// A failure on one image is recorded in its result and never stops the run.
///
/// # Errors
///
/// Returns an error only if writing to `output` fails.
pub fn classify_source(
    classifier: &dyn Classifier,
    source: &dyn ImageSource,
    output: &dyn ResultOutput,
    progress: &dyn ProgressSink,
) -> anyhow::Result<RunSummary> {
    let total = source.count_hint();
    let mut summary = RunSummary::default();

    for (index, item) in source.images().enumerate() {
        let result = match item {
            Ok(EncodedImage { path, bytes }) => {
                progress.on_event(ProgressEvent::Started {
                    path: path.clone(),
                    index,
                    total,
                });
                let outcome = match classify_bytes(classifier, &bytes) {
                    Ok(prediction) => ClassificationOutcome::Classified(prediction),
                    Err(e) => ClassificationOutcome::Failed {
                        error: e.to_string(),
                    },
                };
                FileResult { path, outcome }
            }
            // The error message carries the path via anyhow context
            Err(e) => FileResult {
                path: format!("image {index}"),
                outcome: ClassificationOutcome::Failed {
                    error: format!("{e:#}"),
                },
            },
        };

        match &result.outcome {
            ClassificationOutcome::Classified(prediction) => {
                summary.classified += 1;
                progress.on_event(ProgressEvent::Classified {
                    path: result.path.clone(),
                    class: prediction.predicted_class,
                    score: prediction.engagement_score,
                });
            }
            ClassificationOutcome::Failed { error } => {
                summary.failed += 1;
                progress.on_event(ProgressEvent::Failed {
                    path: result.path.clone(),
                    reason: error.clone(),
                });
            }
        }

        output.write(&result)?;
    }

    output.flush()?;
    progress.on_event(ProgressEvent::Finished {
        classified: summary.classified,
        failed: summary.failed,
    });

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::{ClassProbabilities, EngagementClass, INPUT_SHAPE};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::sync::Mutex;

    struct FixedClassifier(ClassProbabilities);

    impl Classifier for FixedClassifier {
        fn input_shape(&self) -> [usize; 3] {
            INPUT_SHAPE
        }

        fn predict(&self, _input: &ImageTensor) -> anyhow::Result<ClassProbabilities> {
            Ok(self.0)
        }
    }

    struct BrokenClassifier;

    impl Classifier for BrokenClassifier {
        fn input_shape(&self) -> [usize; 3] {
            INPUT_SHAPE
        }

        fn predict(&self, _input: &ImageTensor) -> anyhow::Result<ClassProbabilities> {
            anyhow::bail!("device lost")
        }
    }

    struct VecSource(Vec<anyhow::Result<EncodedImage>>);

    impl ImageSource for VecSource {
        fn images(&self) -> Box<dyn Iterator<Item = anyhow::Result<EncodedImage>> + Send + '_> {
            Box::new(self.0.iter().map(|item| match item {
                Ok(image) => Ok(image.clone()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }))
        }

        fn count_hint(&self) -> Option<usize> {
            Some(self.0.len())
        }
    }

    #[derive(Default)]
    struct Collect(Mutex<Vec<FileResult>>);

    impl ResultOutput for Collect {
        fn write(&self, result: &FileResult) -> anyhow::Result<()> {
            self.0.lock().expect("lock").push(result.clone());
            Ok(())
        }

        fn flush(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct Quiet;

    impl ProgressSink for Quiet {
        fn on_event(&self, _event: ProgressEvent) {}
    }

    fn png() -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([10, 20, 30])));
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).expect("encode");
        buf.into_inner()
    }

    #[test]
    fn test_classify_bytes() {
        let classifier =
            FixedClassifier(ClassProbabilities::new([0.1, 0.0, 0.0, 0.0, 0.9, 0.0]));

        let prediction = classify_bytes(&classifier, &png()).expect("classify");

        assert_eq!(prediction.predicted_class, EngagementClass::Drowsy);
        assert!((prediction.engagement_score - 0.19).abs() < 1e-9);
    }

    #[test]
    fn test_bad_bytes_are_client_errors() {
        let classifier = FixedClassifier(ClassProbabilities::new([0.0; 6]));

        let err = classify_bytes(&classifier, b"nope").expect_err("should fail");

        assert!(err.is_client_error());
    }

    #[test]
    fn test_inference_failure_is_server_error() {
        let err = classify_bytes(&BrokenClassifier, &png()).expect_err("should fail");

        assert!(!err.is_client_error());
        assert!(err.to_string().contains("device lost"));
    }

    #[test]
    fn test_classify_source_isolates_failures() {
        let classifier =
            FixedClassifier(ClassProbabilities::one_hot(EngagementClass::ActivelyLooking));
        let source = VecSource(vec![
            Ok(EncodedImage::new("a.png", png())),
            Ok(EncodedImage::new("b.png", b"corrupt".to_vec())),
            Err(anyhow::anyhow!("Failed to read c.png")),
            Ok(EncodedImage::new("d.png", png())),
        ]);
        let output = Collect::default();

        let summary = classify_source(&classifier, &source, &output, &Quiet).expect("run");

        assert_eq!(
            summary,
            RunSummary {
                classified: 2,
                failed: 2
            }
        );
        let results = output.0.lock().expect("lock");
        let paths: Vec<_> = results.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, ["a.png", "b.png", "image 2", "d.png"]);
        assert!(results[0].outcome.is_success());
        assert!(!results[1].outcome.is_success());
        assert!(results[3].outcome.is_success());
    }
}
