//! Engagement class labels and their fixed engagement weights.

use std::fmt;

use serde::{Serialize, Serializer};

/// One of the six mutually exclusive engagement states the classifier predicts.
///
/// Declaration order is the model's output order: the discriminant of each
/// variant is the index of its probability in the model output vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EngagementClass {
    /// Looking at the screen or lecturer.
    ActivelyLooking = 0,
    /// Visibly bored.
    Bored = 1,
    /// Engaged but struggling with the material.
    Confused = 2,
    /// Attention elsewhere.
    Distracted = 3,
    /// Falling asleep.
    Drowsy = 4,
    /// Socially engaged with classmates.
    TalkingToPeers = 5,
}

/// Number of engagement classes.
pub const CLASS_COUNT: usize = 6;

/// Class labels in model output order.
pub const CLASS_NAMES: [&str; CLASS_COUNT] = [
    "Actively Looking",
    "Bored",
    "Confused",
    "Distracted",
    "Drowsy",
    "Talking to Peers",
];

/// Engagement weight per class, in descending weight order.
///
/// The scorer sums in this order so results are reproducible to the last bit.
pub const ENGAGEMENT_WEIGHTS: [(EngagementClass, f64); CLASS_COUNT] = [
    (EngagementClass::ActivelyLooking, 1.0),
    (EngagementClass::Confused, 0.6),
    (EngagementClass::TalkingToPeers, 0.5),
    (EngagementClass::Distracted, 0.3),
    (EngagementClass::Bored, 0.2),
    (EngagementClass::Drowsy, 0.1),
];

impl EngagementClass {
    /// All classes in model output order.
    pub const ALL: [Self; CLASS_COUNT] = [
        Self::ActivelyLooking,
        Self::Bored,
        Self::Confused,
        Self::Distracted,
        Self::Drowsy,
        Self::TalkingToPeers,
    ];

    /// Position of this class in the model output vector.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the class at `index` in model output order.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Parses a human-readable label such as `"Talking to Peers"`.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        CLASS_NAMES
            .iter()
            .position(|name| *name == label)
            .and_then(Self::from_index)
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        CLASS_NAMES[self.index()]
    }

    /// Engagement weight in `[0.1, 1.0]`.
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::ActivelyLooking => 1.0,
            Self::Confused => 0.6,
            Self::TalkingToPeers => 0.5,
            Self::Distracted => 0.3,
            Self::Bored => 0.2,
            Self::Drowsy => 0.1,
        }
    }
}

impl fmt::Display for EngagementClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for EngagementClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_in_output_order() {
        let labels: Vec<_> = EngagementClass::ALL.iter().map(|c| c.label()).collect();
        assert_eq!(labels, CLASS_NAMES);
    }

    #[test]
    fn test_index_round_trip() {
        for (i, class) in EngagementClass::ALL.iter().enumerate() {
            assert_eq!(class.index(), i);
            assert_eq!(EngagementClass::from_index(i), Some(*class));
        }
        assert_eq!(EngagementClass::from_index(CLASS_COUNT), None);
    }

    #[test]
    fn test_from_label() {
        assert_eq!(
            EngagementClass::from_label("Talking to Peers"),
            Some(EngagementClass::TalkingToPeers)
        );
        assert_eq!(EngagementClass::from_label("talking to peers"), None);
    }

    #[test]
    fn test_weight_table() {
        let expected = [
            ("Actively Looking", 1.0),
            ("Confused", 0.6),
            ("Talking to Peers", 0.5),
            ("Distracted", 0.3),
            ("Bored", 0.2),
            ("Drowsy", 0.1),
        ];
        for (label, weight) in expected {
            let class = EngagementClass::from_label(label).unwrap_or_else(|| panic!("{label}"));
            assert!((class.weight() - weight).abs() < f64::EPSILON, "{label}");
        }
    }

    #[test]
    fn test_weights_in_range() {
        for (class, weight) in ENGAGEMENT_WEIGHTS {
            assert!((0.1..=1.0).contains(&weight), "{class}");
            assert!((class.weight() - weight).abs() < f64::EPSILON, "{class}");
        }
    }

    #[test]
    fn test_weight_table_covers_every_class_once() {
        let mut seen: Vec<_> = ENGAGEMENT_WEIGHTS.iter().map(|(c, _)| *c).collect();
        seen.sort();
        assert_eq!(seen, EngagementClass::ALL);
    }

    #[test]
    fn test_serializes_as_label() {
        let json = serde_json::to_string(&EngagementClass::Drowsy).unwrap_or_default();
        assert_eq!(json, "\"Drowsy\"");
    }
}
