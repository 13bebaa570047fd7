//! Analyzer UI module
//!
//! Organization of the Vizia GUI:
//! - `state`: Data model and events
//! - `components`: Reusable UI builders
//! - `layout`: Top-level layout structure
//! - `meters`: Metric bar widget

pub mod components;
pub mod layout;
pub mod meters;
pub mod state;

#[allow(unused_imports)]
pub use meters::{MetricBar, MetricKind};
#[allow(unused_imports)]
pub use state::{AnalyzerData, AnalyzerEvent};

// Main UI entry point
pub use layout::build_ui;
