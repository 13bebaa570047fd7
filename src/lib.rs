pub mod config;
pub mod dsp;
pub mod engine;
pub mod export;
pub mod meters;
pub mod scoring;
pub mod session;
mod ui;

use nih_plug::prelude::*;
use nih_plug_vizia::{create_vizia_editor, ViziaState, ViziaTheming};
use std::sync::Arc;
use ui::build_ui;

pub use config::{AnalysisConfig, ConfigError, ScoringWeights, TimeBase};
pub use engine::AnalysisEngine;
pub use export::{ExportError, ExportSummary, FileSink, TableSink, WriterSink};
pub use meters::{MetricSnapshot, PublishedMetrics};
pub use session::{DataPoint, SessionLogger, SessionRecorder};

/// Build a connected engine / published state / session logger triple.
///
/// The engine goes to the audio thread; the metrics and the logger are
/// shared with observers.
pub fn build_analyzer(
    config: AnalysisConfig,
) -> Result<(AnalysisEngine, Arc<PublishedMetrics>, Arc<SessionLogger>), ConfigError> {
    config.validate()?;
    Ok(assemble(config))
}

fn assemble(config: AnalysisConfig) -> (AnalysisEngine, Arc<PublishedMetrics>, Arc<SessionLogger>) {
    let metrics = Arc::new(PublishedMetrics::new());
    let (session, recorder) = SessionLogger::new(&config, metrics.clone());
    let engine = AnalysisEngine::from_validated(config, metrics.clone(), recorder);
    (engine, metrics, Arc::new(session))
}

/// Work the audio thread defers to the host's background thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerTask {
    /// Move queued session points into the log.
    DrainSession,
}

pub fn run_analyzer_task(session: &SessionLogger, task: AnalyzerTask) {
    match task {
        AnalyzerTask::DrainSession => {
            session.drain();
        }
    }
}

// -----------------------------------------------------------------------------
// PARAMETERS
// -----------------------------------------------------------------------------

/// The analyzer exposes no host parameters, so host state save/restore has
/// nothing to persist.
#[derive(Params, Default)]
pub struct AnalyzerParams {}

// -----------------------------------------------------------------------------
// PLUGIN STRUCT
// -----------------------------------------------------------------------------
struct AcousticResearchPlugin {
    params: Arc<AnalyzerParams>,
    editor_state: Arc<ViziaState>,
    engine: AnalysisEngine,
    metrics: Arc<PublishedMetrics>,
    session: Arc<SessionLogger>,
}

impl Default for AcousticResearchPlugin {
    fn default() -> Self {
        // Defaults always validate; see config tests.
        let (engine, metrics, session) = assemble(AnalysisConfig::default());
        Self {
            params: Arc::new(AnalyzerParams::default()),
            editor_state: ViziaState::new(|| (560, 440)),
            engine,
            metrics,
            session,
        }
    }
}

impl Plugin for AcousticResearchPlugin {
    const NAME: &'static str = "Acoustic Research Tool";
    const VENDOR: &'static str = "Acoustic Research Tool";
    const URL: &'static str = "";
    const EMAIL: &'static str = "";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            ..AudioIOLayout::const_default()
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            ..AudioIOLayout::const_default()
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = AnalyzerTask;

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    fn initialize(
        &mut self,
        _audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.engine.prepare(buffer_config.sample_rate);
            true
        }))
        .unwrap_or(false)
    }

    fn editor(&mut self, _async_executor: AsyncExecutor<Self>) -> Option<Box<dyn Editor>> {
        let metrics = self.metrics.clone();
        let session = self.session.clone();
        create_vizia_editor(
            self.editor_state.clone(),
            ViziaTheming::default(),
            move |cx, _gui_context| {
                build_ui(cx, metrics.clone(), session.clone());
            },
        )
    }

    fn task_executor(&mut self) -> TaskExecutor<Self> {
        let session = self.session.clone();
        Box::new(move |task| run_analyzer_task(&session, task))
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            // Audio passes through untouched; only the first channel is analyzed.
            if let Some(channel) = buffer.as_slice().first() {
                self.engine.process_block(&channel[..]);
            }
            if self.engine.take_session_drain_request() {
                context.execute_background(AnalyzerTask::DrainSession);
            }
            ProcessStatus::Normal
        }))
        .unwrap_or(ProcessStatus::Normal)
    }

    fn reset(&mut self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.engine.reset();
        }));
    }
}

impl ClapPlugin for AcousticResearchPlugin {
    const CLAP_ID: &'static str = "org.acoustic-research-tool.analyzer";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("Psychoacoustic activation metrics with session logging");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Analyzer,
        ClapFeature::Stereo,
        ClapFeature::Mono,
    ];
}

impl Vst3Plugin for AcousticResearchPlugin {
    const VST3_CLASS_ID: [u8; 16] = *b"AcousticResrchT1";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Analyzer];
}

nih_export_clap!(AcousticResearchPlugin);
nih_export_vst3!(AcousticResearchPlugin);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_analyzer_wires_shared_state() {
        let config = AnalysisConfig {
            frame_len: 64,
            history_len: 8,
            time_base: TimeBase::Stream,
            ..AnalysisConfig::default()
        };
        let (mut engine, metrics, session) = build_analyzer(config).unwrap();
        engine.prepare(16000.0);

        session.start_recording();
        engine.process_block(&[0.25; 128]);
        session.stop_recording();

        assert_eq!(metrics.frames_analyzed(), 2);
        assert_eq!(session.data_point_count(), 2);
        assert!((metrics.get_rms_level() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_build_analyzer_rejects_invalid_config() {
        let config = AnalysisConfig {
            history_len: 0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            build_analyzer(config),
            Err(ConfigError::HistoryLength(0))
        ));
    }

    #[test]
    fn test_background_drain_keeps_sessions_longer_than_the_queue() {
        let config = AnalysisConfig {
            frame_len: 64,
            history_len: 8,
            time_base: TimeBase::Stream,
            ..AnalysisConfig::default()
        };
        let capacity = config.session_queue_capacity as u64;
        let (mut engine, metrics, session) = build_analyzer(config).unwrap();
        engine.prepare(48000.0);

        session.start_recording();
        let block = [0.1f32; 512];
        let mut drains = 0;
        for _ in 0..1100 {
            engine.process_block(&block);
            // Stand-in for the host's background thread running the task.
            if engine.take_session_drain_request() {
                run_analyzer_task(&session, AnalyzerTask::DrainSession);
                drains += 1;
            }
        }
        session.stop_recording();

        let frames = metrics.frames_analyzed();
        assert_eq!(frames, 1100 * 512 / 64);
        assert!(frames > capacity);
        assert!(drains >= 2);
        assert_eq!(session.data_point_count() as u64, frames);
        assert_eq!(session.dropped_points(), 0);

        let table = session.export_table().unwrap();
        assert_eq!(table.lines().count() as u64, frames + 1);
    }
}
