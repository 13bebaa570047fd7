//! Loudness dynamics over the amplitude history.
//!
//! Both metrics are recomputed from the full history on every frame; the
//! history is small enough that an incremental version is not worth it.

use crate::dsp::utils::clamp_unit;

/// Population standard deviation.
pub fn std_dev(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let variance = values
        .iter()
        .map(|&v| {
            let d = v - mean;
            d * d
        })
        .sum::<f32>()
        / n;
    variance.sqrt()
}

/// Mean absolute difference between neighbouring values.
pub fn mean_abs_step(values: &[f32]) -> f32 {
    if values.len() < 2 {
        return 0.0;
    }
    let total: f32 = values.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    total / (values.len() - 1) as f32
}

#[derive(Clone, Copy, Debug)]
pub struct TemporalMetrics {
    variability_gain: f32,
    unpredictability_gain: f32,
}

impl TemporalMetrics {
    pub fn new(variability_gain: f32, unpredictability_gain: f32) -> Self {
        Self {
            variability_gain,
            unpredictability_gain,
        }
    }

    pub fn variability(&self, history: &[f32]) -> f32 {
        clamp_unit(std_dev(history) * self.variability_gain)
    }

    pub fn unpredictability(&self, history: &[f32]) -> f32 {
        clamp_unit(mean_abs_step(history) * self.unpredictability_gain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::history::AmplitudeHistory;

    #[test]
    fn test_flat_history_is_calm() {
        let t = TemporalMetrics::new(20.0, 50.0);
        let flat = [0.3f32; 100];
        assert!(t.variability(&flat) < 1e-4);
        assert_eq!(t.unpredictability(&flat), 0.0);
    }

    #[test]
    fn test_known_values() {
        // mean 0.5, population std 0.5
        assert!((std_dev(&[0.0, 1.0]) - 0.5).abs() < 1e-6);
        // |1-0| + |0-1| + |1-0| over 3 steps
        assert!((mean_abs_step(&[0.0, 1.0, 0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert_eq!(mean_abs_step(&[0.4]), 0.0);
    }

    #[test]
    fn test_partial_history_uses_zero_slots() {
        let t = TemporalMetrics::new(20.0, 50.0);
        let mut h = AmplitudeHistory::new(100);
        for _ in 0..10 {
            h.record(0.01);
        }

        // 10 values of 0.01 and 90 zeros.
        let mean = 0.001f32;
        let var = (10.0 * (0.01 - mean).powi(2) + 90.0 * mean * mean) / 100.0;
        let expected_var = (var.sqrt() * 20.0).clamp(0.0, 1.0);
        assert!((t.variability(h.values()) - expected_var).abs() < 1e-5);

        // Only the 0.01 -> 0.0 edge at slot 9/10 differs.
        let expected_unpred = (0.01 / 99.0 * 50.0f32).clamp(0.0, 1.0);
        assert!((t.unpredictability(h.values()) - expected_unpred).abs() < 1e-6);

        // Same inputs, same outputs.
        let mut h2 = AmplitudeHistory::new(100);
        for _ in 0..10 {
            h2.record(0.01);
        }
        assert_eq!(t.variability(h.values()), t.variability(h2.values()));
        assert_eq!(t.unpredictability(h.values()), t.unpredictability(h2.values()));
    }

    #[test]
    fn test_saturates_at_one() {
        let t = TemporalMetrics::new(20.0, 50.0);
        let jumpy: Vec<f32> = (0..100).map(|i| if i % 2 == 0 { 0.0 } else { 1.0 }).collect();
        assert_eq!(t.variability(&jumpy), 1.0);
        assert_eq!(t.unpredictability(&jumpy), 1.0);
    }
}
