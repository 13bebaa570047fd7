//! Analysis configuration.
//!
//! All heuristic constants of the analyzer live here so the engine never
//! hard-codes them. The defaults reproduce the reference behaviour; tests
//! shrink the frame and history sizes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_FRAME_LEN: usize = 2048;
pub const DEFAULT_HISTORY_LEN: usize = 100;
pub const DEFAULT_SAMPLE_RATE: f32 = 44100.0;

const DEFAULT_CENTROID_CEILING_HZ: f32 = 8000.0;
const DEFAULT_HARSHNESS_CROSSOVER_HZ: f32 = 2000.0;
const DEFAULT_HARSHNESS_GAIN: f32 = 2.0;
const DEFAULT_VARIABILITY_GAIN: f32 = 20.0;
const DEFAULT_UNPREDICTABILITY_GAIN: f32 = 50.0;
const DEFAULT_SESSION_QUEUE_CAPACITY: usize = 8192;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("frame length must be a power of two >= 4, got {0}")]
    FrameLength(usize),

    #[error("history length must be >= 2, got {0}")]
    HistoryLength(usize),

    #[error("session queue capacity must be > 0")]
    QueueCapacity,

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: f32 },

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Relative contribution of each normalized metric to the activation score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub centroid: f32,
    pub harshness: f32,
    pub variability: f32,
    pub unpredictability: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            centroid: 0.25,
            harshness: 0.35,
            variability: 0.20,
            unpredictability: 0.20,
        }
    }
}

/// Where session timestamps come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeBase {
    /// Monotonic clock time since recording started.
    #[default]
    WallClock,
    /// Processed sample count since recording started, divided by the sample rate.
    Stream,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Samples per analysis frame (FFT size).
    pub frame_len: usize,
    /// Number of per-block RMS values kept for the temporal metrics.
    pub history_len: usize,
    /// Centroid frequency mapped to 1.0.
    pub centroid_ceiling_hz: f32,
    /// Bins at or above this frequency count as "harsh" energy.
    pub harshness_crossover_hz: f32,
    pub harshness_gain: f32,
    pub variability_gain: f32,
    pub unpredictability_gain: f32,
    pub weights: ScoringWeights,
    pub time_base: TimeBase,
    /// Data points the audio thread can queue before the observer drains them.
    pub session_queue_capacity: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_len: DEFAULT_FRAME_LEN,
            history_len: DEFAULT_HISTORY_LEN,
            centroid_ceiling_hz: DEFAULT_CENTROID_CEILING_HZ,
            harshness_crossover_hz: DEFAULT_HARSHNESS_CROSSOVER_HZ,
            harshness_gain: DEFAULT_HARSHNESS_GAIN,
            variability_gain: DEFAULT_VARIABILITY_GAIN,
            unpredictability_gain: DEFAULT_UNPREDICTABILITY_GAIN,
            weights: ScoringWeights::default(),
            time_base: TimeBase::default(),
            session_queue_capacity: DEFAULT_SESSION_QUEUE_CAPACITY,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_len < 4 || !self.frame_len.is_power_of_two() {
            return Err(ConfigError::FrameLength(self.frame_len));
        }
        if self.history_len < 2 {
            return Err(ConfigError::HistoryLength(self.history_len));
        }
        if self.session_queue_capacity == 0 {
            return Err(ConfigError::QueueCapacity);
        }

        let positive = [
            ("centroid_ceiling_hz", self.centroid_ceiling_hz),
            ("harshness_crossover_hz", self.harshness_crossover_hz),
        ];
        for (key, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidValue { key, value });
            }
        }

        let non_negative = [
            ("harshness_gain", self.harshness_gain),
            ("variability_gain", self.variability_gain),
            ("unpredictability_gain", self.unpredictability_gain),
            ("weights.centroid", self.weights.centroid),
            ("weights.harshness", self.weights.harshness),
            ("weights.variability", self.weights.variability),
            ("weights.unpredictability", self.weights.unpredictability),
        ];
        for (key, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue { key, value });
            }
        }

        Ok(())
    }

    /// Number of magnitude bins produced per frame.
    #[inline]
    pub fn bin_count(&self) -> usize {
        self.frame_len / 2
    }
}
