//! # Teamtime
//!
//! A headless shared-clock controller for teams distributed across time zones.
//!
//! Teamtime keeps a single simulated clock that every team member's local time
//! is projected from. The clock either tracks the real wall clock (Auto mode)
//! or is pinned by a manual, percent-based "scrub" (Manual mode). Every state
//! transition ends in exactly one synchronous re-render, and the currently
//! visible sub-view stays in lockstep with the host's navigation history.
//!
//! ## Core Concepts
//!
//! - **Simulated time**: the one shared clock value, held in [`state::AppState`].
//! - **Auto / Manual**: the two scheduler modes. Auto polls the wall clock on a
//!   fixed period and on window focus; any scrub pins the clock until an
//!   explicit "use current time" intent releases it.
//! - **Intents**: all external input arrives as a closed [`events::Intent`] sum
//!   type and is handled serially by the [`controller::Controller`] loop.
//! - **Host seams**: rendering, history, and the team save call are traits
//!   ([`components::host::RenderSink`], [`components::host::HistoryHost`],
//!   [`components::api::TeamApi`]) so the controller stays host-agnostic.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use teamtime::prelude::*;
//! use teamtime::components::api::HttpTeamApi;
//! use teamtime::components::host::{RecordingHistory, RecordingRender};
//! use teamtime::time::SystemClock;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ControllerConfig::default();
//!     let bootstrap: Bootstrap = serde_json::from_str(r#"{
//!         "team": { "id": "acme", "url": "/teams/acme" },
//!         "people": [ { "name": "Dan", "tz": "America/New_York" } ],
//!         "time": "2026-08-25T14:00:00Z"
//!     }"#)?;
//!
//!     let api = Arc::new(HttpTeamApi::new(&config.api_base));
//!     let controller = Controller::new(
//!         config,
//!         bootstrap,
//!         RecordingRender::default(),
//!         RecordingHistory::default(),
//!         api,
//!         SystemClock,
//!     );
//!
//!     let handle = controller.spawn();
//!     handle.dispatch(Intent::ShowModal("settings".into())).await?;
//!     handle.shutdown();
//!     Ok(())
//! }
//! ```

pub const CONTROLLER_NAME: &str = "Teamtime Controller";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Declare all the modules in the crate.
pub mod components;
pub mod config;
pub mod controller;
pub mod events;
pub mod state;
pub mod time;
pub mod views;

/// A prelude module for easy importing of the most common Teamtime types.
pub mod prelude {
    pub use crate::components::api::TeamApi;
    pub use crate::components::host::{HistoryHost, RenderSink};
    pub use crate::config::ControllerConfig;
    pub use crate::controller::{Controller, Handle, Mode};
    pub use crate::events::{ArrowKey, HostEvent, Intent, KeyOutcome};
    pub use crate::state::{AppState, Bootstrap, Person, TeamInfo, TimeFormat};
    pub use crate::time::WallClock;
    pub use crate::views::View;
}
