use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use teamtime::components::api::HttpTeamApi;
use teamtime::components::host::{HistoryHost, RenderSink};
use teamtime::prelude::*;
use teamtime::time::SystemClock;
use tracing::info;

/// Renders each frame as a log line per person.
struct TracingRender;

impl RenderSink for TracingRender {
    fn render(&mut self, state: &AppState) {
        info!(
            time = %state.time.format("%Y-%m-%d %H:%M"),
            current = state.is_current_time,
            view = state.current_view.as_tag(),
            "render"
        );
        for row in &state.projections {
            info!("  {:<12} {:<20} {}", row.name, row.zone, row.local_time);
        }
    }
}

/// Logs pushed paths instead of touching a real history.
struct TracingHistory;

impl HistoryHost for TracingHistory {
    fn push_path(&mut self, path: &str) {
        info!(%path, "history push");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    // 2. Build a demo bootstrap snapshot and default settings.
    let config = ControllerConfig::default();
    let bootstrap: Bootstrap = serde_json::from_value(json!({
        "team": { "id": "demo", "url": "/teams/demo" },
        "people": [
            { "name": "Dan", "tz": "America/New_York" },
            { "name": "Priya", "tz": "Asia/Kolkata" },
            { "name": "Noriko", "tz": "Asia/Tokyo" },
            { "name": "Lena", "tz": "Europe/Berlin" }
        ],
        "time": chrono::Utc::now().to_rfc3339()
    }))?;

    // 3. Create the controller and spawn its loop.
    let api = Arc::new(HttpTeamApi::new(&config.api_base));
    let controller = Controller::new(
        config,
        bootstrap,
        TracingRender,
        TracingHistory,
        api,
        SystemClock,
    );
    let handle = controller.spawn();

    // 4. Drive a short scripted session to show the state machine.
    handle.dispatch(Intent::ShowModal("settings".into())).await?;
    handle.dispatch(Intent::CloseModal).await?;
    handle.dispatch(Intent::AdjustTimeDisplay(0.5)).await?;
    handle.dispatch(Intent::ChangeTimeFormat(TimeFormat::Hour24)).await?;
    handle.dispatch(Intent::UseCurrentTime).await?;

    // 5. Keep tracking the real clock until a shutdown signal arrives.
    info!("{} running. Press Ctrl+C to shut down.", teamtime::CONTROLLER_NAME);
    tokio::signal::ctrl_c().await?;
    handle.shutdown();
    Ok(())
}
