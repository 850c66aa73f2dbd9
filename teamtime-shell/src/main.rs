use anyhow::Result;
use colored::Colorize;
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use serde_json::json;
use std::borrow::Cow;
use std::env;
use std::sync::{Arc, Mutex};
use teamtime::components::api::HttpTeamApi;
use teamtime::components::host::{RecordingHistory, RenderSink};
use teamtime::prelude::*;
use teamtime::time::SystemClock;
use teamtime::{CONTROLLER_NAME, VERSION as LIB_VERSION};

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A custom helper struct for rustyline that enables syntax highlighting.
#[derive(Completer, Helper, Hinter, Validator)]
struct CommandHighlighter;

impl Highlighter for CommandHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some((command, rest)) = line.split_once(' ') {
            let colored_command = command.yellow().bold();
            let colored_rest = rest.yellow();
            Cow::Owned(format!("{} {}", colored_command, colored_rest))
        } else {
            Cow::Owned(line.yellow().bold().to_string())
        }
    }
    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    println!("{}", "teamtime".cyan().bold());
    println!(
        "          Shell   v{:<8} Library   v{:<8}",
        SHELL_VERSION, LIB_VERSION
    );
    println!(
        "{}",
        "---------------------------------------------------".dimmed()
    );
}

/// Prints the team roster for every frame and keeps the latest frame so the
/// `state` command can replay it. Clones share the same buffer.
#[derive(Clone, Default)]
struct TerminalRender {
    last_frame: Arc<Mutex<String>>,
}

impl TerminalRender {
    fn replay(&self) {
        let frame = self.last_frame.lock().unwrap_or_else(|e| e.into_inner());
        if frame.is_empty() {
            println!("Nothing rendered yet.");
        } else {
            println!("{frame}");
        }
    }
}

impl RenderSink for TerminalRender {
    fn render(&mut self, state: &AppState) {
        let marker = if state.is_current_time {
            "live".green().to_string()
        } else {
            "pinned".red().to_string()
        };
        let mut frame = format!(
            "{} {}  ({}, view: {})",
            "::".cyan(),
            state.time.format("%a %H:%M").to_string().bold(),
            marker,
            state.current_view.as_tag()
        );
        for row in &state.projections {
            frame.push_str(&format!(
                "\n   {:<12} {:<20} {}",
                row.name,
                row.zone.as_str().dimmed(),
                row.local_time.as_str().bold()
            ));
        }
        println!("{frame}");
        *self.last_frame.lock().unwrap_or_else(|e| e.into_inner()) = frame;
    }
}

fn demo_bootstrap() -> Result<Bootstrap> {
    Ok(serde_json::from_value(json!({
        "team": { "id": "demo", "url": "/teams/demo" },
        "people": [
            { "name": "Dan", "tz": "America/New_York" },
            { "name": "Priya", "tz": "Asia/Kolkata" },
            { "name": "Noriko", "tz": "Asia/Tokyo" },
            { "name": "Lena", "tz": "Europe/Berlin" }
        ],
        "time": chrono::Utc::now().to_rfc3339()
    }))?)
}

fn print_help() {
    println!("Available commands:");
    println!("  scrub <P>       - Scrub time by a percent in [-1.0, 1.0]; 0 returns to now.");
    println!("  now             - Track the real clock again.");
    println!("  format <12|24>  - Switch the displayed time format.");
    println!("  open <MODAL>    - Open a modal view (pushes history).");
    println!("  close           - Close the modal (pushes history).");
    println!("  back            - Simulate browser back (pop + popstate).");
    println!("  left | right    - Simulate an arrow key-up on the window.");
    println!("  save <JSON>     - Save the team profile through the API.");
    println!("  state           - Reprint the last rendered frame.");
    println!("  help            - This message.");
    println!("  exit            - Quit the shell.");
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_target(false)
        .init();

    let config = match env::args().nth(1) {
        Some(path) => ControllerConfig::load(&path)?,
        None => ControllerConfig::default(),
    };

    let bootstrap = demo_bootstrap()?;
    let team_url = bootstrap.team.url.clone();

    let render = TerminalRender::default();
    let history = RecordingHistory::default();
    let api = Arc::new(HttpTeamApi::new(&config.api_base));
    let controller = Controller::new(
        config,
        bootstrap,
        render.clone(),
        history.clone(),
        api,
        SystemClock,
    );
    let handle = controller.spawn();

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CommandHighlighter));

    println!(
        "{} is running. Type 'help' for commands or 'exit' to quit.",
        CONTROLLER_NAME.cyan()
    );

    loop {
        let prompt = format!("{}", ">> ".cyan().bold());
        let Ok(line) = rl.readline(&prompt) else {
            println!("Exiting teamtime-shell...");
            break;
        };
        rl.add_history_entry(line.as_str())?;
        let args = line.trim().split_whitespace().collect::<Vec<_>>();

        match args.as_slice() {
            ["scrub", percent] => match percent.parse::<f64>() {
                Ok(p) => handle.dispatch(Intent::AdjustTimeDisplay(p)).await?,
                Err(_) => println!("Error: '{}' is not a number.", percent),
            },
            ["now"] => handle.dispatch(Intent::UseCurrentTime).await?,
            ["format", value] => {
                handle
                    .dispatch_wire("CHANGE_TIME_FORMAT", json!(value))
                    .await?;
            }
            ["open", modal] => {
                handle
                    .dispatch(Intent::ShowModal(modal.to_string()))
                    .await?;
            }
            ["close"] => handle.dispatch(Intent::CloseModal).await?,
            ["back"] => {
                let path = history.pop().unwrap_or_else(|| team_url.clone());
                handle.host_event(HostEvent::PopState(path)).await?;
            }
            ["left"] => {
                handle
                    .host_event(HostEvent::ArrowKey(ArrowKey::Left))
                    .await?;
            }
            ["right"] => {
                handle
                    .host_event(HostEvent::ArrowKey(ArrowKey::Right))
                    .await?;
            }
            ["save", rest @ ..] => {
                let raw = rest.join(" ");
                match serde_json::from_str(&raw) {
                    Ok(info) => handle.dispatch(Intent::SaveTeamInfo(info)).await?,
                    Err(err) => println!("Error: invalid JSON payload: {err}"),
                }
            }
            ["state"] => render.replay(),
            ["help"] => print_help(),
            ["exit"] => break,
            [] => {}
            _ => println!("Unknown command: '{}'. Type 'help'.", line.trim()),
        }
    }

    handle.shutdown();
    Ok(())
}
