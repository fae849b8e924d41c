//! Element handles the controller drives, and an in-memory panel that implements them.

use std::time::{Duration, Instant};

use shared::{domain::StatusKind, protocol::RetrievedChunk};

pub const OUTPUT_FADE_DELAY: Duration = Duration::from_millis(10);
pub const OUTPUT_FADE_DURATION: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub kind: StatusKind,
    pub message: String,
}

impl StatusUpdate {
    pub fn new(kind: StatusKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// The four elements of the query panel: input, submit control, output area
/// and status indicator.
pub trait QueryView {
    fn query_text(&self) -> String;
    fn set_submit_enabled(&mut self, enabled: bool);
    fn clear_output(&mut self);
    /// Replaces the output area with `markup` and starts its fade-in.
    fn show_output(&mut self, markup: String);
    /// Replaces the visible status and marks the indicator active.
    fn show_status(&mut self, status: StatusUpdate);
    /// Drops the `active` class, leaving the message text in place.
    fn deactivate_status(&mut self);
    fn show_sources(&mut self, _chunks: &[RetrievedChunk]) {}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusIndicator {
    pub message: String,
    pub kind: StatusKind,
    pub active: bool,
}

impl StatusIndicator {
    pub fn is_loading(&self) -> bool {
        self.active && self.kind == StatusKind::Loading
    }

    pub fn class_name(&self) -> String {
        let mut classes = String::from("status-indicator");
        if self.active {
            classes.push_str(" active");
        }
        if self.kind == StatusKind::Loading {
            classes.push_str(" loading");
        }
        classes
    }
}

#[derive(Debug, Clone, Default)]
pub struct OutputArea {
    pub markup: String,
    revealed_at: Option<Instant>,
}

impl OutputArea {
    pub fn is_empty(&self) -> bool {
        self.markup.is_empty()
    }

    /// 0.0 right after content is shown, 1.0 once the fade has finished.
    pub fn opacity_at(&self, now: Instant) -> f32 {
        let Some(revealed_at) = self.revealed_at else {
            return 1.0;
        };
        let elapsed = now.saturating_duration_since(revealed_at);
        let Some(fading) = elapsed.checked_sub(OUTPUT_FADE_DELAY) else {
            return 0.0;
        };
        (fading.as_secs_f32() / OUTPUT_FADE_DURATION.as_secs_f32()).min(1.0)
    }

    pub fn is_fading(&self, now: Instant) -> bool {
        self.opacity_at(now) < 1.0
    }
}

#[derive(Debug, Clone)]
pub struct PanelState {
    pub query_input: String,
    pub submit_enabled: bool,
    pub output: OutputArea,
    pub status: StatusIndicator,
    pub sources: Vec<RetrievedChunk>,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            query_input: String::new(),
            submit_enabled: true,
            output: OutputArea::default(),
            status: StatusIndicator::default(),
            sources: Vec::new(),
        }
    }
}

impl QueryView for PanelState {
    fn query_text(&self) -> String {
        self.query_input.clone()
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.submit_enabled = enabled;
    }

    fn clear_output(&mut self) {
        self.output = OutputArea::default();
        self.sources.clear();
    }

    fn show_output(&mut self, markup: String) {
        self.output = OutputArea {
            markup,
            revealed_at: Some(Instant::now()),
        };
    }

    fn show_status(&mut self, status: StatusUpdate) {
        self.status = StatusIndicator {
            message: status.message,
            kind: status.kind,
            active: true,
        };
    }

    fn deactivate_status(&mut self) {
        self.status.active = false;
    }

    fn show_sources(&mut self, chunks: &[RetrievedChunk]) {
        self.sources = chunks.to_vec();
    }
}
