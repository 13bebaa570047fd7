//! Layout builders for the analyzer UI
//!
//! Header with the title, a metrics panel fed by a polling timer and a
//! footer with the session controls.

use crate::meters::PublishedMetrics;
use crate::session::SessionLogger;
use crate::ui::components::{create_button, create_metric_row, create_toggle_button};
use crate::ui::meters::{MetricBar, MetricKind};
use crate::ui::state::{AnalyzerData, AnalyzerEvent};
use nih_plug_vizia::vizia::prelude::*;
use std::sync::Arc;
use std::time::Duration;

const STYLE: &str = include_str!("../ui.css");

// ~30 Hz meter refresh.
const REFRESH_INTERVAL: Duration = Duration::from_millis(33);

pub fn build_header(cx: &mut Context) -> Handle<'_, HStack> {
    HStack::new(cx, |cx| {
        VStack::new(cx, |cx| {
            Label::new(cx, "ACOUSTIC RESEARCH").class("header-title");
            Label::new(cx, "Psychoacoustic activation analysis").class("header-sub");
        })
        .class("header-title-stack");
    })
    .class("header")
}

pub fn build_metrics(cx: &mut Context, metrics: Arc<PublishedMetrics>) -> Handle<'_, VStack> {
    VStack::new(cx, move |cx| {
        Binding::new(cx, AnalyzerData::readouts, move |cx, lens| {
            let readouts = lens.get(cx);
            for (i, kind) in MetricKind::ALL.iter().copied().enumerate() {
                let value = readouts.values.get(i).cloned().unwrap_or_default();
                let m = metrics.clone();
                create_metric_row(cx, kind.title(), value, move |cx| {
                    MetricBar::new(cx, m, kind).class("metric-bar");
                });
            }
        });
    })
    .class("metrics-panel")
}

pub fn build_footer(cx: &mut Context) -> Handle<'_, HStack> {
    HStack::new(cx, |cx| {
        VStack::new(cx, |cx| {
            Label::new(cx, AnalyzerData::session_text).class("session-text");
            Label::new(cx, AnalyzerData::status_text).class("status-text");
        })
        .class("session-stack");

        Element::new(cx).class("fill-width");

        Binding::new(cx, AnalyzerData::recording, |cx, lens| {
            let recording = lens.get(cx);
            HStack::new(cx, move |cx| {
                create_toggle_button(
                    cx,
                    if recording { "Stop" } else { "Record" },
                    recording,
                    "record-button-active",
                    "record-button",
                    |cx| cx.emit(AnalyzerEvent::ToggleRecording),
                );
                create_button(cx, "Export CSV", "footer-button", |cx| {
                    cx.emit(AnalyzerEvent::Export)
                });
            })
            .class("session-controls");
        });
    })
    .class("footer")
}

pub fn build_ui(cx: &mut Context, metrics: Arc<PublishedMetrics>, session: Arc<SessionLogger>) {
    if let Err(e) = cx.add_stylesheet(STYLE) {
        log::error!("Failed to load stylesheet: {:?}", e);
    }

    AnalyzerData::new(metrics.clone(), session).build(cx);

    let timer = cx.add_timer(REFRESH_INTERVAL, None, |cx, action| {
        if let TimerAction::Tick(_) = action {
            cx.emit(AnalyzerEvent::Refresh);
        }
    });
    cx.start_timer(timer);

    VStack::new(cx, move |cx| {
        build_header(cx);
        build_metrics(cx, metrics.clone());
        build_footer(cx);
    })
    .class("app-root");
}
