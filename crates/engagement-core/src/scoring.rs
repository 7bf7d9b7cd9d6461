//! Engagement scoring.
//!
//! The score is the probability-weighted sum of fixed per-class weights:
//!
//! | Class            | Weight |
//! |------------------|--------|
//! | Actively Looking | 1.0    |
//! | Confused         | 0.6    |
//! | Talking to Peers | 0.5    |
//! | Distracted       | 0.3    |
//! | Bored            | 0.2    |
//! | Drowsy           | 0.1    |
//!
//! For a probability vector summing to 1 the score lies in `[0.1, 1.0]`.
//! Float sums that drift from 1 move the bound slightly; that is not an error.

use crate::domain::{ClassProbabilities, ENGAGEMENT_WEIGHTS};

/// Computes the engagement score, rounded to three decimals.
#[must_use]
pub fn engagement_score(probabilities: &ClassProbabilities) -> f64 {
    let score: f64 = ENGAGEMENT_WEIGHTS
        .iter()
        .map(|(class, weight)| f64::from(probabilities.get(*class)) * weight)
        .sum();
    round_to_thousandths(score)
}

/// Rounds to three decimals, resolving exact ties to the even neighbour.
#[must_use]
pub fn round_to_thousandths(value: f64) -> f64 {
    (value * 1000.0).round_ties_even() / 1000.0
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::domain::EngagementClass;

    #[test]
    fn test_actively_looking_scores_one() {
        let probs = ClassProbabilities::one_hot(EngagementClass::ActivelyLooking);
        assert_eq!(engagement_score(&probs), 1.0);
    }

    #[test]
    fn test_drowsy_scores_point_one() {
        let probs = ClassProbabilities::one_hot(EngagementClass::Drowsy);
        assert_eq!(engagement_score(&probs), 0.1);
    }

    #[test]
    fn test_one_hot_scores_equal_weights() {
        for class in EngagementClass::ALL {
            let probs = ClassProbabilities::one_hot(class);
            assert_eq!(engagement_score(&probs), class.weight(), "{class}");
        }
    }

    #[test]
    fn test_uniform_distribution() {
        let probs = ClassProbabilities::new([1.0 / 6.0; 6]);
        assert_eq!(engagement_score(&probs), 0.45);
    }

    #[test]
    fn test_mixed_distribution() {
        // 0.5*1.0 + 0.3*0.6 + 0.2*0.1 = 0.7
        let probs = ClassProbabilities::new([0.5, 0.0, 0.3, 0.0, 0.2, 0.0]);
        assert_eq!(engagement_score(&probs), 0.7);
    }

    #[test]
    fn test_score_is_rounded_to_three_decimals() {
        let probs = ClassProbabilities::new([0.123_456, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(engagement_score(&probs), 0.123);
    }

    #[test]
    fn test_ties_round_to_even() {
        assert_eq!(round_to_thousandths(0.0625), 0.062);
        assert_eq!(round_to_thousandths(0.1875), 0.188);
        assert_eq!(round_to_thousandths(0.3125), 0.312);
    }

    #[test]
    fn test_exact_tie_through_scorer() {
        let probs = ClassProbabilities::new([0.0625, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(engagement_score(&probs), 0.062);
    }

    #[test]
    fn test_all_zero_probabilities() {
        let probs = ClassProbabilities::new([0.0; 6]);
        assert_eq!(engagement_score(&probs), 0.0);
    }

    #[test]
    fn test_bounded_for_normalized_inputs() {
        let cases = [
            [0.2, 0.2, 0.2, 0.2, 0.1, 0.1],
            [0.0, 0.5, 0.0, 0.0, 0.5, 0.0],
            [0.9, 0.02, 0.02, 0.02, 0.02, 0.02],
        ];
        for values in cases {
            let score = engagement_score(&ClassProbabilities::new(values));
            assert!((0.1..=1.0).contains(&score), "{values:?} -> {score}");
        }
    }
}
