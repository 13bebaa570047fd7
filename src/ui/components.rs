//! Reusable UI component builders
//!
//! Styling is handled via CSS classes defined in ui.css.

use nih_plug_vizia::vizia::prelude::*;

pub fn create_button<'a>(
    cx: &'a mut Context,
    label: &'static str,
    class: &'static str,
    callback: impl Fn(&mut EventContext) + 'static,
) -> Handle<'a, Button> {
    Button::new(cx, callback, |cx| Label::new(cx, label)).class(class)
}

pub fn create_toggle_button<'a>(
    cx: &'a mut Context,
    label: &'static str,
    is_active: bool,
    active_class: &'static str,
    inactive_class: &'static str,
    callback: impl Fn(&mut EventContext) + 'static,
) -> Handle<'a, Button> {
    Button::new(cx, callback, |cx| Label::new(cx, label)).class(if is_active {
        active_class
    } else {
        inactive_class
    })
}

/// Title, bar and value text for one published metric.
pub fn create_metric_row<'a>(
    cx: &'a mut Context,
    title: &'static str,
    value: String,
    bar: impl FnOnce(&mut Context),
) -> Handle<'a, HStack> {
    HStack::new(cx, move |cx| {
        Label::new(cx, title).class("metric-title");
        bar(cx);
        Label::new(cx, value.as_str()).class("metric-value");
    })
    .class("metric-row")
}
