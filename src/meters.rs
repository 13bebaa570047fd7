//! Lock-free published analysis state.
//!
//! The audio thread writes each metric into its own atomic cell; the editor
//! (or any other observer) reads them without coordination. Each field is
//! individually atomic. A reader can see fields from two neighbouring frames,
//! never a torn value.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

pub const INITIAL_ACTIVATION_SCORE: f32 = 50.0;

/// Plain copy of every published value, read field by field.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MetricSnapshot {
    pub spectral_centroid: f32,
    pub spectral_harshness: f32,
    pub dynamic_variability: f32,
    pub temporal_unpredictability: f32,
    pub rms_level: f32,
    pub activation_score: f32,
}

pub struct PublishedMetrics {
    spectral_centroid: AtomicU32,
    spectral_harshness: AtomicU32,
    dynamic_variability: AtomicU32,
    temporal_unpredictability: AtomicU32,
    rms_level: AtomicU32,
    activation_score: AtomicU32,

    // Stream bookkeeping used by the session clock and the editor.
    frames_analyzed: AtomicU64,
    samples_processed: AtomicU64,
    sample_rate: AtomicU32,
}

impl Default for PublishedMetrics {
    fn default() -> Self {
        Self {
            spectral_centroid: AtomicU32::new(0.0f32.to_bits()),
            spectral_harshness: AtomicU32::new(0.0f32.to_bits()),
            dynamic_variability: AtomicU32::new(0.0f32.to_bits()),
            temporal_unpredictability: AtomicU32::new(0.0f32.to_bits()),
            rms_level: AtomicU32::new(0.0f32.to_bits()),
            activation_score: AtomicU32::new(INITIAL_ACTIVATION_SCORE.to_bits()),
            frames_analyzed: AtomicU64::new(0),
            samples_processed: AtomicU64::new(0),
            sample_rate: AtomicU32::new(0.0f32.to_bits()),
        }
    }
}

#[inline]
fn load_f32(cell: &AtomicU32) -> f32 {
    f32::from_bits(cell.load(Ordering::Relaxed))
}

#[inline]
fn store_f32(cell: &AtomicU32, val: f32) {
    cell.store(val.to_bits(), Ordering::Relaxed);
}

impl PublishedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_spectral_centroid(&self, val: f32) {
        store_f32(&self.spectral_centroid, val);
    }

    pub fn set_spectral_harshness(&self, val: f32) {
        store_f32(&self.spectral_harshness, val);
    }

    pub fn set_dynamic_variability(&self, val: f32) {
        store_f32(&self.dynamic_variability, val);
    }

    pub fn set_temporal_unpredictability(&self, val: f32) {
        store_f32(&self.temporal_unpredictability, val);
    }

    pub fn set_rms_level(&self, val: f32) {
        store_f32(&self.rms_level, val);
    }

    pub fn set_activation_score(&self, val: f32) {
        store_f32(&self.activation_score, val);
    }

    pub fn get_spectral_centroid(&self) -> f32 {
        load_f32(&self.spectral_centroid)
    }

    pub fn get_spectral_harshness(&self) -> f32 {
        load_f32(&self.spectral_harshness)
    }

    pub fn get_dynamic_variability(&self) -> f32 {
        load_f32(&self.dynamic_variability)
    }

    pub fn get_temporal_unpredictability(&self) -> f32 {
        load_f32(&self.temporal_unpredictability)
    }

    pub fn get_rms_level(&self) -> f32 {
        load_f32(&self.rms_level)
    }

    pub fn get_activation_score(&self) -> f32 {
        load_f32(&self.activation_score)
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            spectral_centroid: self.get_spectral_centroid(),
            spectral_harshness: self.get_spectral_harshness(),
            dynamic_variability: self.get_dynamic_variability(),
            temporal_unpredictability: self.get_temporal_unpredictability(),
            rms_level: self.get_rms_level(),
            activation_score: self.get_activation_score(),
        }
    }

    /// Bumped after every completed analysis frame.
    pub fn mark_frame_analyzed(&self) {
        self.frames_analyzed.fetch_add(1, Ordering::Release);
    }

    pub fn frames_analyzed(&self) -> u64 {
        self.frames_analyzed.load(Ordering::Acquire)
    }

    pub fn set_samples_processed(&self, samples: u64) {
        self.samples_processed.store(samples, Ordering::Release);
    }

    pub fn samples_processed(&self) -> u64 {
        self.samples_processed.load(Ordering::Acquire)
    }

    pub fn set_sample_rate(&self, sample_rate: f32) {
        store_f32(&self.sample_rate, sample_rate);
    }

    pub fn sample_rate(&self) -> f32 {
        load_f32(&self.sample_rate)
    }

    /// Restore the metric cells to their initial values. Stream counters keep
    /// running so session timestamps stay monotonic.
    pub fn reset(&self) {
        self.set_spectral_centroid(0.0);
        self.set_spectral_harshness(0.0);
        self.set_dynamic_variability(0.0);
        self.set_temporal_unpredictability(0.0);
        self.set_rms_level(0.0);
        self.set_activation_score(INITIAL_ACTIVATION_SCORE);
    }
}
