//! Render and history seams between the controller and its host.

use crate::state::AppState;
use crate::views::View;
use chrono::DateTime;
use chrono_tz::Tz;
use std::sync::{Arc, Mutex};

/// The sole consumer of [`AppState`].
///
/// Called synchronously after every state mutation. Implementations must be
/// idempotent: rendering the same state twice produces the same observable
/// output, so redundant calls are always safe.
pub trait RenderSink: Send {
    fn render(&mut self, state: &AppState);
}

/// Abstraction over the host's navigation history.
///
/// `push_path` records a new path without triggering a navigation reload.
/// Back/forward movements come back to the controller as
/// [`crate::events::HostEvent::PopState`].
pub trait HistoryHost: Send {
    fn push_path(&mut self, path: &str);
}

/// One captured render, enough to assert on every observable transition.
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub time: DateTime<Tz>,
    pub is_current_time: bool,
    pub view: View,
}

/// A render sink that records each frame. Clones share the same buffer, so a
/// test or host can keep one handle while the controller owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingRender {
    frames: Arc<Mutex<Vec<RenderedFrame>>>,
}

impl RecordingRender {
    pub fn frames(&self) -> Vec<RenderedFrame> {
        self.frames.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn last_frame(&self) -> Option<RenderedFrame> {
        self.frames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }
}

impl RenderSink for RecordingRender {
    fn render(&mut self, state: &AppState) {
        self.frames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RenderedFrame {
                time: state.time,
                is_current_time: state.is_current_time,
                view: state.current_view.clone(),
            });
    }
}

/// A history host that records pushed paths into a shared stack.
#[derive(Debug, Clone, Default)]
pub struct RecordingHistory {
    paths: Arc<Mutex<Vec<String>>>,
}

impl RecordingHistory {
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn last_path(&self) -> Option<String> {
        self.paths
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }

    /// Pops the newest entry, returning the path now on top. Hosts use this
    /// to simulate a browser "back" before emitting the matching pop event.
    pub fn pop(&self) -> Option<String> {
        let mut paths = self.paths.lock().unwrap_or_else(|e| e.into_inner());
        paths.pop();
        paths.last().cloned()
    }
}

impl HistoryHost for RecordingHistory {
    fn push_path(&mut self, path: &str) {
        self.paths
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(path.to_string());
    }
}
