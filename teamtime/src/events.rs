//! The closed intent sum type and the events delivered by the host.
//!
//! Every external input the controller reacts to is either an [`Intent`]
//! (user-originated actions) or a [`HostEvent`] (browser-originated
//! navigation, focus, and key events). Intents are matched exhaustively, so
//! an unhandled variant is a compile error; leniency toward genuinely unknown
//! input exists only at the untyped wire boundary in [`Intent::from_wire`].

use crate::state::TimeFormat;
use serde_json::Value;

/// A user-originated action, processed serially by the controller loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Switch the 12h/24h display preference.
    ChangeTimeFormat(TimeFormat),
    /// Release a manual scrub and track the real clock again.
    UseCurrentTime,
    /// Scrub the simulated time by a normalized offset in `[-1.0, 1.0]`,
    /// where 1.0 is twelve hours ahead of the real current time.
    AdjustTimeDisplay(f64),
    /// Return to the base view, pushing history.
    CloseModal,
    /// Open the named modal, pushing history.
    ShowModal(String),
    /// Persist an edited team profile through the external save boundary.
    SaveTeamInfo(Value),
}

impl Intent {
    /// Decodes an untyped `(action_type, value)` wire pair.
    ///
    /// Unknown action tags and malformed values yield `None`; callers drop
    /// them without error, preserving the ignore-unknown contract for
    /// externally-sourced input.
    pub fn from_wire(action_type: &str, value: Value) -> Option<Intent> {
        match action_type {
            "CHANGE_TIME_FORMAT" => TimeFormat::from_wire(&value).map(Intent::ChangeTimeFormat),
            "USE_CURRENT_TIME" => Some(Intent::UseCurrentTime),
            "ADJUST_TIME_DISPLAY" => value.as_f64().map(Intent::AdjustTimeDisplay),
            "CLOSE_MODAL" => Some(Intent::CloseModal),
            "SHOW_MODAL" => value.as_str().map(|id| Intent::ShowModal(id.to_string())),
            "SAVE_TEAM_INFO" => Some(Intent::SaveTeamInfo(value)),
            _ => None,
        }
    }
}

/// The two arrow keys the scrub control listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKey {
    Left,
    Right,
}

/// Browser-originated events, delivered by the host adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Back/forward navigation landed on the given path. History is not
    /// re-pushed for a navigation the host already performed.
    PopState(String),
    /// The window regained focus; in Auto mode this triggers a sync.
    FocusRegained,
    /// An arrow key-up reached the window while the scrub control context
    /// is relevant.
    ArrowKey(ArrowKey),
}

/// What the host adapter should do with the key event it forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Suppress the browser default (scrolling) and focus the scrub input.
    SuppressDefault,
    /// Not a key this controller cares about.
    Ignored,
}
