//! Classifier output and per-image prediction results.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::class::{EngagementClass, CLASS_COUNT};
use crate::scoring::engagement_score;

/// Probability per engagement class, in model output order.
///
/// Values are expected in `[0, 1]` but are not required to sum to exactly 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassProbabilities([f32; CLASS_COUNT]);

impl ClassProbabilities {
    /// Wraps a probability vector in model output order.
    #[must_use]
    pub const fn new(values: [f32; CLASS_COUNT]) -> Self {
        Self(values)
    }

    /// Builds from a model output slice; `None` unless it has exactly six entries.
    #[must_use]
    pub fn from_slice(values: &[f32]) -> Option<Self> {
        <[f32; CLASS_COUNT]>::try_from(values).ok().map(Self)
    }

    /// All mass on a single class.
    #[must_use]
    pub fn one_hot(class: EngagementClass) -> Self {
        let mut values = [0.0; CLASS_COUNT];
        values[class.index()] = 1.0;
        Self(values)
    }

    /// Probability of `class`.
    #[must_use]
    pub const fn get(&self, class: EngagementClass) -> f32 {
        self.0[class.index()]
    }

    /// Raw values in model output order.
    #[must_use]
    pub const fn as_array(&self) -> &[f32; CLASS_COUNT] {
        &self.0
    }

    /// Iterates `(class, probability)` pairs in model output order.
    pub fn iter(&self) -> impl Iterator<Item = (EngagementClass, f32)> + '_ {
        EngagementClass::ALL.iter().map(|c| (*c, self.get(*c)))
    }

    /// The most probable class and its probability.
    ///
    /// Equal maxima resolve to the lowest index. NaN never wins.
    #[must_use]
    pub fn argmax(&self) -> (EngagementClass, f32) {
        let mut best = EngagementClass::ActivelyLooking;
        let mut best_value = self.0[0];
        for (class, value) in self.iter().skip(1) {
            if value > best_value || (best_value.is_nan() && !value.is_nan()) {
                best = class;
                best_value = value;
            }
        }
        (best, best_value)
    }
}

impl Serialize for ClassProbabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(CLASS_COUNT))?;
        for (class, value) in self.iter() {
            map.serialize_entry(class.label(), &f64::from(value))?;
        }
        map.end()
    }
}

/// Classification of a single image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Argmax class.
    pub predicted_class: EngagementClass,
    /// Probability of the predicted class.
    pub confidence: f64,
    /// Probability of every class.
    pub class_probabilities: ClassProbabilities,
    /// Weighted engagement score rounded to three decimals.
    pub engagement_score: f64,
}

impl Prediction {
    /// Derives predicted class, confidence and engagement score from a probability vector.
    #[must_use]
    pub fn from_probabilities(class_probabilities: ClassProbabilities) -> Self {
        let (predicted_class, confidence) = class_probabilities.argmax();
        Self {
            predicted_class,
            confidence: f64::from(confidence),
            engagement_score: engagement_score(&class_probabilities),
            class_probabilities,
        }
    }
}

/// Outcome of classifying one item in a multi-image request.
///
/// Serializes flat: either the prediction fields or a single `error` field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClassificationOutcome {
    /// The item was classified.
    Classified(Prediction),
    /// The item failed; the message is safe to show to clients.
    Failed {
        /// Failure description.
        error: String,
    },
}

impl ClassificationOutcome {
    /// Returns true if the item was classified.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Classified(_))
    }
}
