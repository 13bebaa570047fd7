//! Bar widget for the published metrics.
//!
//! Reads straight from `crate::meters::PublishedMetrics` on every draw.

use crate::meters::PublishedMetrics;
use crate::scoring::SCORE_MAX;
use nih_plug_vizia::vizia::prelude::*;
use nih_plug_vizia::vizia::vg;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MetricKind {
    ActivationScore,
    SpectralCentroid,
    SpectralHarshness,
    DynamicVariability,
    TemporalUnpredictability,
    RmsLevel,
}

impl MetricKind {
    pub const ALL: [MetricKind; 6] = [
        MetricKind::ActivationScore,
        MetricKind::SpectralCentroid,
        MetricKind::SpectralHarshness,
        MetricKind::DynamicVariability,
        MetricKind::TemporalUnpredictability,
        MetricKind::RmsLevel,
    ];

    pub fn title(self) -> &'static str {
        match self {
            MetricKind::ActivationScore => "Activation",
            MetricKind::SpectralCentroid => "Brightness",
            MetricKind::SpectralHarshness => "Harshness",
            MetricKind::DynamicVariability => "Variability",
            MetricKind::TemporalUnpredictability => "Unpredictability",
            MetricKind::RmsLevel => "RMS",
        }
    }

    /// Current value mapped to 0..1 for drawing.
    pub fn normalized(self, m: &PublishedMetrics) -> f32 {
        let v = match self {
            MetricKind::ActivationScore => m.get_activation_score() / SCORE_MAX,
            MetricKind::SpectralCentroid => m.get_spectral_centroid(),
            MetricKind::SpectralHarshness => m.get_spectral_harshness(),
            MetricKind::DynamicVariability => m.get_dynamic_variability(),
            MetricKind::TemporalUnpredictability => m.get_temporal_unpredictability(),
            // -60..0 dBFS
            MetricKind::RmsLevel => {
                let rms = m.get_rms_level();
                if rms > 1e-6 {
                    (20.0 * rms.log10() + 60.0) / 60.0
                } else {
                    0.0
                }
            }
        };
        v.clamp(0.0, 1.0)
    }
}

pub struct MetricBar {
    metrics: Arc<PublishedMetrics>,
    kind: MetricKind,
}

impl MetricBar {
    pub fn new(cx: &mut Context, metrics: Arc<PublishedMetrics>, kind: MetricKind) -> Handle<'_, Self> {
        Self { metrics, kind }.build(cx, |_| {})
    }
}

impl View for MetricBar {
    fn element(&self) -> Option<&'static str> {
        Some("metric-bar")
    }

    fn draw(&self, cx: &mut DrawContext, canvas: &mut Canvas) {
        let b = cx.bounds();
        let norm = self.kind.normalized(&self.metrics);

        let mut bg = vg::Path::new();
        bg.rounded_rect(b.x, b.y, b.w, b.h, 2.0);
        canvas.fill_path(&bg, &vg::Paint::color(vg::Color::rgb(15, 23, 42)));

        if norm > 0.001 {
            let mut fill = vg::Path::new();
            fill.rounded_rect(b.x, b.y, b.w * norm, b.h, 2.0);

            // The score reads "calm is high", every other metric "calm is low".
            let paint = if self.kind == MetricKind::ActivationScore {
                vg::Paint::linear_gradient(
                    b.x,
                    b.y,
                    b.x + b.w,
                    b.y,
                    vg::Color::rgb(239, 68, 68),
                    vg::Color::rgb(34, 197, 94),
                )
            } else {
                vg::Paint::linear_gradient(
                    b.x,
                    b.y,
                    b.x + b.w,
                    b.y,
                    vg::Color::rgb(34, 197, 94),
                    vg::Color::rgb(239, 68, 68),
                )
            };
            canvas.fill_path(&fill, &paint);
        }

        canvas.stroke_path(
            &bg,
            &vg::Paint::color(vg::Color::rgb(71, 85, 105)).with_line_width(1.0),
        );
    }
}
