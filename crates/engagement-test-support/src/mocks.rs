//! Mock implementations of core port traits.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use engagement_core::domain::{
    ClassProbabilities, EncodedImage, EngagementClass, FileResult, ImageTensor, INPUT_SHAPE,
};
use engagement_core::ports::{Classifier, ImageSource, ProgressEvent, ProgressSink, ResultOutput};

/// Mock implementation of `Classifier` returning fixed probabilities.
///
/// Counts forward passes and records the shape of every input it sees.
pub struct MockClassifier {
    probabilities: ClassProbabilities,
    calls: AtomicUsize,
    shapes: Mutex<Vec<[usize; 4]>>,
}

impl MockClassifier {
    /// Creates a classifier that always returns `probabilities`.
    #[must_use]
    pub fn new(probabilities: ClassProbabilities) -> Self {
        Self {
            probabilities,
            calls: AtomicUsize::new(0),
            shapes: Mutex::new(Vec::new()),
        }
    }

    /// Creates a classifier that puts all mass on `class`.
    #[must_use]
    pub fn certain(class: EngagementClass) -> Self {
        Self::new(ClassProbabilities::one_hot(class))
    }

    /// Returns the number of forward passes run.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns the shapes of all inputs seen, in call order.
    #[must_use]
    pub fn input_shapes(&self) -> Vec<[usize; 4]> {
        self.shapes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Classifier for MockClassifier {
    fn input_shape(&self) -> [usize; 3] {
        INPUT_SHAPE
    }

    fn predict(&self, input: &ImageTensor) -> anyhow::Result<ClassProbabilities> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.shapes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(input.shape());
        Ok(self.probabilities)
    }
}

/// Classifier whose forward pass always fails with `message`.
pub struct FailingClassifier {
    message: String,
}

impl FailingClassifier {
    /// Creates a failing classifier.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Classifier for FailingClassifier {
    fn input_shape(&self) -> [usize; 3] {
        INPUT_SHAPE
    }

    fn predict(&self, _input: &ImageTensor) -> anyhow::Result<ClassProbabilities> {
        anyhow::bail!("{}", self.message)
    }
}

/// Classifier that panics inside the forward pass.
///
/// Either on every call, or only on one call (zero-based) while the others
/// return a certain `Actively Looking`.
pub struct PanickingClassifier {
    panic_on: Option<usize>,
    calls: AtomicUsize,
}

impl PanickingClassifier {
    /// Panics on every call.
    #[must_use]
    pub const fn always() -> Self {
        Self {
            panic_on: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Panics only on call number `index`, counting from zero.
    #[must_use]
    pub const fn on_call(index: usize) -> Self {
        Self {
            panic_on: Some(index),
            calls: AtomicUsize::new(0),
        }
    }
}

impl Classifier for PanickingClassifier {
    fn input_shape(&self) -> [usize; 3] {
        INPUT_SHAPE
    }

    fn predict(&self, _input: &ImageTensor) -> anyhow::Result<ClassProbabilities> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.panic_on {
            Some(index) if index != call => Ok(ClassProbabilities::one_hot(
                EngagementClass::ActivelyLooking,
            )),
            _ => panic!("secret internal state corrupted"),
        }
    }
}

/// Mock implementation of `ImageSource` for testing.
///
/// Yields pre-built images and tracks iteration for assertions.
pub struct MockImageSource {
    images: Vec<EncodedImage>,
    iteration_count: Arc<Mutex<usize>>,
}

impl MockImageSource {
    /// Creates a new mock source with the given images.
    #[must_use]
    pub fn new(images: Vec<EncodedImage>) -> Self {
        Self {
            images,
            iteration_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Creates an empty mock source.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// Returns the number of times the source has been iterated.
    #[must_use]
    pub fn iteration_count(&self) -> usize {
        *self
            .iteration_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl ImageSource for MockImageSource {
    fn images(&self) -> Box<dyn Iterator<Item = anyhow::Result<EncodedImage>> + Send + '_> {
        if let Ok(mut c) = self.iteration_count.lock() {
            *c += 1;
        }
        Box::new(self.images.iter().cloned().map(Ok))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.images.len())
    }
}

/// Mock implementation of `ResultOutput` for testing.
///
/// Captures results for later assertions.
pub struct MockResultOutput {
    results: Arc<Mutex<Vec<FileResult>>>,
    flush_count: Arc<Mutex<usize>>,
}

impl MockResultOutput {
    /// Creates a new mock output.
    #[must_use]
    pub fn new() -> Self {
        Self {
            results: Arc::new(Mutex::new(Vec::new())),
            flush_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns all captured results.
    #[must_use]
    pub fn results(&self) -> Vec<FileResult> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of times `flush()` was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockResultOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultOutput for MockResultOutput {
    fn write(&self, result: &FileResult) -> anyhow::Result<()> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(result.clone());
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        if let Ok(mut c) = self.flush_count.lock() {
            *c += 1;
        }
        Ok(())
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures events for later assertions.
pub struct MockProgressSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of `Started` events.
    #[must_use]
    pub fn started_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Started { .. }))
            .count()
    }

    /// Returns the number of `Failed` events.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Failed { .. }))
            .count()
    }

    /// Returns the final counts from the `Finished` event, if any.
    #[must_use]
    pub fn finished_counts(&self) -> Option<(usize, usize)> {
        self.events().iter().find_map(|e| match e {
            ProgressEvent::Finished { classified, failed } => Some((*classified, *failed)),
            _ => None,
        })
    }
}

impl Default for MockProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
