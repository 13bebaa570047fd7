//! Spectral brightness and harshness from a magnitude spectrum.

use crate::dsp::utils::{bin_frequency, clamp_unit};

/// First bin counted as "high" energy: `floor(crossover_hz * frame_len / sample_rate)`.
pub fn crossover_bin(crossover_hz: f32, frame_len: usize, sample_rate: f32) -> usize {
    if sample_rate <= 0.0 || !sample_rate.is_finite() {
        return 0;
    }
    let bin = (crossover_hz as f64 * frame_len as f64 / sample_rate as f64).floor();
    if bin <= 0.0 {
        0
    } else {
        bin as usize
    }
}

/// Magnitude-weighted mean frequency in Hz, 0 for an empty spectrum.
pub fn spectral_centroid_hz(mags: &[f32], sample_rate: f32, frame_len: usize) -> f32 {
    let mut num = 0.0f32;
    let mut den = 0.0f32;
    for (k, &m) in mags.iter().enumerate() {
        num += m * bin_frequency(k, sample_rate, frame_len);
        den += m;
    }
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// Share of total magnitude in bins `>= crossover`, 0 for an empty spectrum.
pub fn high_energy_ratio(mags: &[f32], crossover: usize) -> f32 {
    let mut low = 0.0f32;
    let mut high = 0.0f32;
    for (k, &m) in mags.iter().enumerate() {
        if k < crossover {
            low += m;
        } else {
            high += m;
        }
    }
    let total = low + high;
    if total > 0.0 {
        high / total
    } else {
        0.0
    }
}

/// Per-frame spectral metric calculator. Holds the sample-rate dependent
/// crossover bin so it is only recomputed on `prepare`.
pub struct SpectralMetrics {
    frame_len: usize,
    sample_rate: f32,
    crossover_hz: f32,
    crossover: usize,
    centroid_ceiling_hz: f32,
    harshness_gain: f32,
}

impl SpectralMetrics {
    pub fn new(
        frame_len: usize,
        sample_rate: f32,
        crossover_hz: f32,
        centroid_ceiling_hz: f32,
        harshness_gain: f32,
    ) -> Self {
        Self {
            frame_len,
            sample_rate,
            crossover_hz,
            crossover: crossover_bin(crossover_hz, frame_len, sample_rate),
            centroid_ceiling_hz,
            harshness_gain,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.crossover = crossover_bin(self.crossover_hz, self.frame_len, sample_rate);
    }

    #[inline]
    pub fn crossover(&self) -> usize {
        self.crossover
    }

    /// Centroid normalized by the ceiling frequency, in [0, 1].
    pub fn centroid(&self, mags: &[f32]) -> f32 {
        let hz = spectral_centroid_hz(mags, self.sample_rate, self.frame_len);
        clamp_unit(hz / self.centroid_ceiling_hz)
    }

    /// High-band ratio scaled by the harshness gain, in [0, 1].
    pub fn harshness(&self, mags: &[f32]) -> f32 {
        clamp_unit(high_energy_ratio(mags, self.crossover) * self.harshness_gain)
    }
}
