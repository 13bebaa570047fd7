use std::f32::consts::PI;

/// Clamp to `[lo, hi]`, mapping NaN and infinities to `lo`.
#[inline]
pub fn clamp_finite(x: f32, lo: f32, hi: f32) -> f32 {
    if x.is_finite() {
        x.clamp(lo, hi)
    } else {
        lo
    }
}

#[inline]
pub fn clamp_unit(x: f32) -> f32 {
    clamp_finite(x, 0.0, 1.0)
}

/// Root-mean-square of a block. Empty blocks are silent.
pub fn block_rms(x: &[f32]) -> f32 {
    if x.is_empty() {
        return 0.0;
    }
    let mut s = 0.0f32;
    for &v in x {
        s += v * v;
    }
    (s / x.len() as f32).sqrt()
}

/// Centre frequency of FFT bin `k`.
#[inline]
pub fn bin_frequency(k: usize, sample_rate: f32, frame_len: usize) -> f32 {
    (k as f64 * sample_rate as f64 / frame_len as f64) as f32
}

/// Symmetric Hann window of length `n`.
pub fn hann_window(n: usize) -> Vec<f32> {
    if n < 2 {
        return vec![1.0; n];
    }
    let denom = (n - 1) as f32;
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / denom).cos()))
        .collect()
}
