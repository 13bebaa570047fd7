//! Real-time analysis engine.
//!
//! Runs entirely on the audio thread: per-block RMS into the amplitude
//! history, sample-accurate framing, and on every completed frame the
//! spectral and temporal metrics, the composite score, publication and
//! (while recording) one session data point.
//!
//! INVARIANT: `process_block` never allocates, locks or logs. Everything it
//! touches is sized in `new`.

use std::sync::Arc;

use crate::config::{AnalysisConfig, ConfigError, DEFAULT_SAMPLE_RATE};
use crate::dsp::{
    block_rms, clamp_finite, AmplitudeHistory, FrameAccumulator, SpectralMetrics,
    SpectralTransform, TemporalMetrics,
};
use crate::meters::{MetricSnapshot, PublishedMetrics};
use crate::scoring::{activation_score, NormalizedMetrics};
use crate::session::SessionRecorder;

/// Everything that runs once per completed frame.
struct FrameAnalyzer {
    config: AnalysisConfig,
    sample_rate: f32,
    transform: SpectralTransform,
    spectral: SpectralMetrics,
    temporal: TemporalMetrics,
    history: AmplitudeHistory,
    metrics: Arc<PublishedMetrics>,
    recorder: SessionRecorder,
}

impl FrameAnalyzer {
    fn analyze(&mut self, frame: &mut [f32], stream_pos: u64) {
        let mags = self.transform.magnitudes(frame);
        let centroid = self.spectral.centroid(mags);
        let harshness = self.spectral.harshness(mags);

        let values = self.history.values();
        let variability = self.temporal.variability(values);
        let unpredictability = self.temporal.unpredictability(values);

        let normalized = NormalizedMetrics {
            centroid,
            harshness,
            variability,
            unpredictability,
        };
        let score = activation_score(&normalized, &self.config.weights);

        self.metrics.set_spectral_centroid(centroid);
        self.metrics.set_spectral_harshness(harshness);
        self.metrics.set_dynamic_variability(variability);
        self.metrics.set_temporal_unpredictability(unpredictability);
        self.metrics.set_activation_score(score);
        self.metrics.mark_frame_analyzed();

        if self.recorder.is_recording() {
            let snapshot = MetricSnapshot {
                spectral_centroid: centroid,
                spectral_harshness: harshness,
                dynamic_variability: variability,
                temporal_unpredictability: unpredictability,
                rms_level: self.metrics.get_rms_level(),
                activation_score: score,
            };
            self.recorder
                .record(&snapshot, stream_pos, self.sample_rate);
        }
    }
}

pub struct AnalysisEngine {
    accumulator: FrameAccumulator,
    analyzer: FrameAnalyzer,
}

impl AnalysisEngine {
    pub fn new(
        config: AnalysisConfig,
        metrics: Arc<PublishedMetrics>,
        recorder: SessionRecorder,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_validated(config, metrics, recorder))
    }

    /// Caller guarantees `config.validate()` succeeds.
    pub(crate) fn from_validated(
        config: AnalysisConfig,
        metrics: Arc<PublishedMetrics>,
        recorder: SessionRecorder,
    ) -> Self {
        let sample_rate = DEFAULT_SAMPLE_RATE;
        metrics.set_sample_rate(sample_rate);

        Self {
            accumulator: FrameAccumulator::new(config.frame_len),
            analyzer: FrameAnalyzer {
                sample_rate,
                transform: SpectralTransform::new(config.frame_len),
                spectral: SpectralMetrics::new(
                    config.frame_len,
                    sample_rate,
                    config.harshness_crossover_hz,
                    config.centroid_ceiling_hz,
                    config.harshness_gain,
                ),
                temporal: TemporalMetrics::new(
                    config.variability_gain,
                    config.unpredictability_gain,
                ),
                history: AmplitudeHistory::new(config.history_len),
                metrics,
                recorder,
                config,
            },
        }
    }

    /// Configure for a (possibly new) stream sample rate. Restarts framing.
    /// Called from the host's setup path, never from the audio callback.
    pub fn prepare(&mut self, sample_rate: f32) {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            log::warn!(
                "ignoring invalid sample rate {sample_rate}, keeping {}",
                self.analyzer.sample_rate
            );
            return;
        }

        self.analyzer.sample_rate = sample_rate;
        self.analyzer.spectral.set_sample_rate(sample_rate);
        self.analyzer.metrics.set_sample_rate(sample_rate);
        self.accumulator.reset();

        log::debug!(
            "prepared analysis: {} Hz, frame {}, crossover bin {}",
            sample_rate,
            self.accumulator.frame_len(),
            self.analyzer.spectral.crossover()
        );
    }

    /// Drop the partial frame and the amplitude history and republish the
    /// initial metric values.
    pub fn reset(&mut self) {
        self.accumulator.reset();
        self.analyzer.history.reset();
        self.analyzer.metrics.reset();
    }

    /// Feed one block of mono samples. Returns the number of frames analyzed.
    pub fn process_block(&mut self, block: &[f32]) -> usize {
        if block.is_empty() {
            return 0;
        }

        let rms = clamp_finite(block_rms(block), 0.0, f32::MAX);
        self.analyzer.metrics.set_rms_level(rms);
        self.analyzer.history.record(rms);

        let analyzer = &mut self.analyzer;
        let completed = self
            .accumulator
            .ingest(block, |frame, pos| analyzer.analyze(frame, pos));

        self.analyzer
            .metrics
            .set_samples_processed(self.accumulator.position());
        completed
    }

    /// Whether the session queue wants an observer-side drain. Fires once per
    /// backlog; the host shim schedules [`crate::AnalyzerTask::DrainSession`].
    pub fn take_session_drain_request(&self) -> bool {
        self.analyzer.recorder.take_drain_request()
    }

    pub fn sample_rate(&self) -> f32 {
        self.analyzer.sample_rate
    }

    pub fn crossover_bin(&self) -> usize {
        self.analyzer.spectral.crossover()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.analyzer.config
    }

    pub fn metrics(&self) -> &Arc<PublishedMetrics> {
        &self.analyzer.metrics
    }
}
