//! Composite acoustic activation score.
//!
//! Lower spectral and temporal activity maps to a higher ("calmer") score.
//! The weights are heuristic placeholders carried in [`ScoringWeights`].

use crate::config::ScoringWeights;
use crate::dsp::utils::clamp_finite;

pub const SCORE_MAX: f32 = 100.0;

/// The four normalized inputs of the score, each in [0, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NormalizedMetrics {
    pub centroid: f32,
    pub harshness: f32,
    pub variability: f32,
    pub unpredictability: f32,
}

pub fn activation_score(m: &NormalizedMetrics, w: &ScoringWeights) -> f32 {
    let score = SCORE_MAX
        * ((1.0 - m.centroid) * w.centroid
            + (1.0 - m.harshness) * w.harshness
            + (1.0 - m.variability) * w.variability
            + (1.0 - m.unpredictability) * w.unpredictability);
    clamp_finite(score, 0.0, SCORE_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_scores_maximum() {
        let score = activation_score(&NormalizedMetrics::default(), &ScoringWeights::default());
        assert!((score - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_full_activity_scores_zero() {
        let m = NormalizedMetrics {
            centroid: 1.0,
            harshness: 1.0,
            variability: 1.0,
            unpredictability: 1.0,
        };
        assert_eq!(activation_score(&m, &ScoringWeights::default()), 0.0);
    }

    #[test]
    fn test_weighted_sum() {
        let m = NormalizedMetrics {
            centroid: 0.5,
            harshness: 0.0,
            variability: 1.0,
            unpredictability: 0.0,
        };
        // 100 * (0.5*0.25 + 0.35 + 0 + 0.20)
        let expected = 67.5;
        assert!((activation_score(&m, &ScoringWeights::default()) - expected).abs() < 1e-4);
    }

    #[test]
    fn test_is_deterministic() {
        let m = NormalizedMetrics {
            centroid: 0.123,
            harshness: 0.456,
            variability: 0.789,
            unpredictability: 0.321,
        };
        let w = ScoringWeights::default();
        assert_eq!(
            activation_score(&m, &w).to_bits(),
            activation_score(&m, &w).to_bits()
        );
    }

    #[test]
    fn test_clamped_with_oversized_weights() {
        let w = ScoringWeights {
            centroid: 1.0,
            harshness: 1.0,
            variability: 1.0,
            unpredictability: 1.0,
        };
        assert_eq!(activation_score(&NormalizedMetrics::default(), &w), 100.0);
    }
}
