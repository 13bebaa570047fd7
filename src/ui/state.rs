//! State management for the analyzer UI
//!
//! Holds the text shown by the editor and turns button presses into
//! session logger calls. The published metrics are polled on a timer.

use crate::export::{default_export_path, ExportError, FileSink};
use crate::meters::PublishedMetrics;
use crate::session::SessionLogger;
use crate::ui::meters::MetricKind;
use nih_plug_vizia::vizia::prelude::*;
use std::sync::Arc;

#[derive(Lens, Clone)]
pub struct AnalyzerData {
    pub metrics: Arc<PublishedMetrics>,
    pub session: Arc<SessionLogger>,
    pub readouts: MetricReadouts,
    pub recording: bool,
    pub session_text: String,
    pub status_text: String,
}

/// Formatted values, one per `MetricKind::ALL` entry.
#[derive(Clone, Data, PartialEq, Default)]
pub struct MetricReadouts {
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzerEvent {
    Refresh,
    ToggleRecording,
    Export,
}

impl AnalyzerData {
    pub fn new(metrics: Arc<PublishedMetrics>, session: Arc<SessionLogger>) -> Self {
        let mut data = Self {
            metrics,
            session,
            readouts: MetricReadouts::default(),
            recording: false,
            session_text: String::new(),
            status_text: "Idle".into(),
        };
        data.refresh();
        data
    }

    fn refresh(&mut self) {
        let s = self.metrics.snapshot();
        self.readouts.values = MetricKind::ALL
            .iter()
            .map(|kind| match kind {
                MetricKind::ActivationScore => format!("{:.1}", s.activation_score),
                MetricKind::SpectralCentroid => format!("{:.3}", s.spectral_centroid),
                MetricKind::SpectralHarshness => format!("{:.3}", s.spectral_harshness),
                MetricKind::DynamicVariability => format!("{:.3}", s.dynamic_variability),
                MetricKind::TemporalUnpredictability => {
                    format!("{:.3}", s.temporal_unpredictability)
                }
                MetricKind::RmsLevel => format!("{:.4}", s.rms_level),
            })
            .collect();

        self.recording = self.session.is_recording();
        let points = self.session.data_point_count();
        self.session_text = if self.recording {
            format!(
                "Recording {:.1} s, {} points",
                self.session.elapsed_recording_time(),
                points
            )
        } else {
            format!("{} points recorded", points)
        };
    }

    fn export(&self) -> String {
        let mut sink = FileSink::new(default_export_path());
        match self.session.export_to(&mut sink) {
            Ok(summary) => format!(
                "Exported {} points to {}",
                summary.rows, summary.destination
            ),
            Err(ExportError::NoData) => "No data to export. Record a session first.".into(),
            Err(e @ ExportError::Write(_)) => format!("Export failed: {}", e),
        }
    }
}

impl Model for AnalyzerData {
    fn event(&mut self, cx: &mut EventContext, event: &mut Event) {
        event.map(|analyzer_event, _| match analyzer_event {
            AnalyzerEvent::Refresh => {
                self.refresh();
                cx.needs_redraw();
            }
            AnalyzerEvent::ToggleRecording => {
                if self.session.is_recording() {
                    self.session.stop_recording();
                    self.status_text = "Stopped".into();
                } else {
                    self.session.start_recording();
                    self.status_text = "Recording".into();
                }
                self.refresh();
            }
            AnalyzerEvent::Export => {
                self.status_text = self.export();
            }
        });
    }
}
