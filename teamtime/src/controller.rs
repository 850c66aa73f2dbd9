//! The controller that owns the application state and serializes all intents.
//!
//! External input enters through [`Handle`] channels and is drained by a
//! single consumer loop: one intent or host event is handled to completion,
//! including its re-render, before the next is read. The loop exclusively
//! owns the [`AppState`], so no locking is needed anywhere in the core.

use crate::components::api::TeamApi;
use crate::components::host::{HistoryHost, RenderSink};
use crate::config::ControllerConfig;
use crate::events::{ArrowKey, HostEvent, Intent, KeyOutcome};
use crate::state::{AppState, Bootstrap};
use crate::time::{round_to_quarter_hour, truncate_to_minute, WallClock, MINUTES_IN_12_HOURS};
use crate::views::View;
use anyhow::{anyhow, Result};
use chrono::{Duration as TimeDelta, Timelike};
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace};

/// The two scheduler states of the simulated clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The simulated time tracks the real clock via polling and focus events.
    Auto,
    /// The simulated time is pinned by a manual scrub until released.
    Manual,
}

/// The shared-clock controller.
///
/// Owns the single [`AppState`], the render sink, the history host, and the
/// save boundary. All mutation paths funnel through the methods below, and
/// each of them ends in at most one render.
pub struct Controller<R, H, A: ?Sized, C> {
    config: ControllerConfig,
    state: AppState,
    render: R,
    history: H,
    api: Arc<A>,
    clock: C,
    mode: Mode,
}

impl<R, H, A, C> Controller<R, H, A, C>
where
    R: RenderSink,
    H: HistoryHost,
    A: TeamApi + ?Sized + 'static,
    C: WallClock,
{
    /// Builds the controller from a bootstrap snapshot.
    ///
    /// The scheduler starts in Auto mode; the first poll tick of [`run`]
    /// pins the simulated time to the real clock.
    ///
    /// [`run`]: Controller::run
    pub fn new(
        config: ControllerConfig,
        bootstrap: Bootstrap,
        render: R,
        history: H,
        api: Arc<A>,
        clock: C,
    ) -> Self {
        let state = AppState::from_bootstrap(bootstrap, config.timezone);
        Self {
            config,
            state,
            render,
            history,
            api,
            clock,
            mode: Mode::Auto,
        }
    }

    /// Read access to the full state snapshot.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The current scheduler state.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Handles one intent to completion. Exhaustive over every variant; the
    /// lenient drop of unknown input happens at the wire decoder, not here.
    pub fn handle_intent(&mut self, intent: Intent) {
        debug!(?intent, "handling intent");
        match intent {
            Intent::ChangeTimeFormat(format) => {
                self.state.time_format = format;
                self.state.project();
                self.render.render(&self.state);
            }
            Intent::UseCurrentTime => self.enter_auto(),
            Intent::AdjustTimeDisplay(percent) => self.scrub_to_percent(percent),
            Intent::CloseModal => self.navigate_to(View::App, true),
            Intent::ShowModal(id) => self.navigate_to(View::Modal(id), true),
            Intent::SaveTeamInfo(info) => self.spawn_save(info),
        }
    }

    /// Handles one browser-originated event.
    pub fn handle_host_event(&mut self, event: HostEvent) {
        trace!(?event, "handling host event");
        match event {
            HostEvent::PopState(path) => {
                // The host already performed this navigation; decode the new
                // path and update the view without re-pushing history.
                let view = View::from_path(&self.state.team.url, &path);
                self.navigate_to(view, false);
            }
            HostEvent::FocusRegained => {
                if self.mode == Mode::Auto {
                    self.sync_to_now();
                }
            }
            HostEvent::ArrowKey(key) => {
                self.handle_arrow_key(key);
            }
        }
    }

    /// Pins the simulated hour and minute to the real clock.
    ///
    /// A no-op (no render) when the displayed hour/minute already match,
    /// which keeps the 20-second poll from re-rendering an unchanged view.
    /// The date components are written through untouched.
    pub fn sync_to_now(&mut self) {
        let now = self.clock.now_utc().with_timezone(&self.config.timezone);
        if now.hour() == self.state.time.hour() && now.minute() == self.state.time.minute() {
            return;
        }

        let updated = self
            .state
            .time
            .with_hour(now.hour())
            .and_then(|t| t.with_minute(now.minute()))
            .map(truncate_to_minute);
        self.state.time = match updated {
            Some(time) => time,
            // Unrepresentable in the preserved date (DST gap): take the real
            // instant instead of keeping a stale clock.
            None => truncate_to_minute(now),
        };
        self.state.is_current_time = true;
        self.state.project();
        self.render.render(&self.state);
    }

    /// Moves the simulated time to `now + 720 * percent` minutes, snapped to
    /// the quarter-hour grid.
    ///
    /// The offset is always anchored at the real current time, never at the
    /// previously displayed time; repeated scrubs cannot accumulate drift.
    /// A percent of zero is the "return to the present" intent and re-enters
    /// Auto mode instead.
    pub fn scrub_to_percent(&mut self, percent: f64) {
        if percent == 0.0 {
            self.enter_auto();
            return;
        }

        let percent = if self.config.clamp_scrub {
            percent.clamp(-1.0, 1.0)
        } else {
            percent
        };
        self.enter_manual();

        let delta_minutes = (MINUTES_IN_12_HOURS as f64 * percent).round() as i64;
        let mut target =
            self.clock.now_utc().with_timezone(&self.config.timezone) + TimeDelta::minutes(delta_minutes);
        target += TimeDelta::minutes(round_to_quarter_hour(target.minute()));

        self.state.time = truncate_to_minute(target);
        self.state.is_current_time = false;
        self.state.project();
        self.render.render(&self.state);
    }

    /// An arrow key-up reached the window: force Manual so the poll cannot
    /// fight the user, and re-render. The simulated time itself does not
    /// move; the key exists to hand focus to the scrub control.
    pub fn handle_arrow_key(&mut self, key: ArrowKey) -> KeyOutcome {
        debug!(?key, "arrow key grabs the scrub control");
        self.enter_manual();
        self.render.render(&self.state);
        KeyOutcome::SuppressDefault
    }

    /// Sets the current view and re-renders, pushing the encoded path onto
    /// host history when `push_history` is true.
    pub fn navigate_to(&mut self, view: View, push_history: bool) {
        self.state.current_view = view;
        if push_history {
            let path = self.state.current_view.to_path(&self.state.team.url);
            self.history.push_path(&path);
        }
        self.render.render(&self.state);
    }

    /// Attaches the CSRF token and issues exactly one write for the team
    /// resource. No optimistic state change happens before the write, so a
    /// failure leaves nothing to roll back; the error reaches the caller
    /// unmodified.
    pub fn save_team_info(&self, info: Value) -> BoxFuture<'static, Result<Value>> {
        let mut info = info;
        match info.as_object_mut() {
            Some(body) => {
                body.insert("_csrf".to_string(), Value::String(self.state.csrf_token.clone()));
            }
            None => {
                return Box::pin(async { Err(anyhow!("team info payload must be a JSON object")) })
            }
        }
        self.api.save_team_info(&self.state.team.id, info)
    }

    /// Dispatcher path for saves: fire the write as an independent task.
    /// A second save intent before the first resolves simply issues a second
    /// write; in-flight saves are never cancelled or queued.
    fn spawn_save(&self, info: Value) {
        let save = self.save_team_info(info);
        tokio::spawn(async move {
            match save.await {
                Ok(body) => info!(response = %body, "team info saved"),
                Err(err) => error!(error = %err, "team info save failed"),
            }
        });
    }

    /// Transition into Auto and immediately pin to the real clock. Re-entering
    /// Auto while already in Auto only re-syncs; the poll arm in [`run`] is
    /// guarded by the mode, so the timer can never be armed twice.
    ///
    /// [`run`]: Controller::run
    fn enter_auto(&mut self) {
        if self.mode != Mode::Auto {
            info!("scheduler released, tracking the real clock");
            self.mode = Mode::Auto;
        }
        self.sync_to_now();
    }

    fn enter_manual(&mut self) {
        if self.mode != Mode::Manual {
            info!("scheduler pinned by manual input");
            self.mode = Mode::Manual;
        }
    }

    /// Runs the single-consumer loop until shutdown or until both input
    /// channels close.
    ///
    /// The select is biased so shutdown wins, then queued input, then the
    /// poll tick; input is processed strictly in delivery order and never
    /// batched. The poll arm is disabled while the scheduler is Manual,
    /// which is what "cancels the timer" means here.
    pub async fn run(
        mut self,
        mut intents: mpsc::Receiver<Intent>,
        mut host_events: mpsc::Receiver<HostEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<()> {
        info!(team = %self.state.team.id, "controller starting up");
        self.render.render(&self.state);

        let mut poll = tokio::time::interval(self.config.poll_interval());
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                maybe_intent = intents.recv() => match maybe_intent {
                    Some(intent) => self.handle_intent(intent),
                    None => break,
                },
                Some(event) = host_events.recv() => self.handle_host_event(event),
                _ = poll.tick(), if self.mode == Mode::Auto => self.sync_to_now(),
            }
        }

        info!("controller has shut down");
        Ok(())
    }
}

impl<R, H, A, C> Controller<R, H, A, C>
where
    R: RenderSink + 'static,
    H: HistoryHost + 'static,
    A: TeamApi + ?Sized + 'static,
    C: WallClock + 'static,
{
    /// Spawns [`run`] on the current runtime and returns a cloneable handle.
    ///
    /// [`run`]: Controller::run
    pub fn spawn(self) -> Handle {
        const CHANNEL_CAPACITY: usize = 64;
        let (intent_tx, intent_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (host_tx, host_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        tokio::spawn(async move {
            if let Err(err) = self.run(intent_rx, host_rx, shutdown_rx).await {
                error!(error = %err, "controller loop stopped with an error");
            }
        });

        Handle {
            intents: intent_tx,
            host_events: host_tx,
            shutdown: shutdown_tx,
        }
    }
}

/// A cloneable handle to a running controller.
#[derive(Debug, Clone)]
pub struct Handle {
    intents: mpsc::Sender<Intent>,
    host_events: mpsc::Sender<HostEvent>,
    shutdown: broadcast::Sender<()>,
}

impl Handle {
    /// Queues one intent; intents are handled strictly in dispatch order.
    pub async fn dispatch(&self, intent: Intent) -> Result<()> {
        self.intents
            .send(intent)
            .await
            .map_err(|_| anyhow!("controller is no longer running"))
    }

    /// Decodes and queues an untyped wire action. Unknown tags are dropped
    /// with a debug log; they are never an error.
    pub async fn dispatch_wire(&self, action_type: &str, value: Value) -> Result<()> {
        match Intent::from_wire(action_type, value) {
            Some(intent) => self.dispatch(intent).await,
            None => {
                debug!(%action_type, "ignoring unknown wire action");
                Ok(())
            }
        }
    }

    /// Queues one browser-originated event.
    pub async fn host_event(&self, event: HostEvent) -> Result<()> {
        self.host_events
            .send(event)
            .await
            .map_err(|_| anyhow!("controller is no longer running"))
    }

    /// Asks the loop to stop. Safe to call more than once.
    pub fn shutdown(&self) {
        self.shutdown.send(()).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::host::{RecordingHistory, RecordingRender};
    use crate::time::FixedClock;
    use chrono::{TimeZone, Utc};
    use futures::future;

    struct NullApi;

    impl TeamApi for NullApi {
        fn save_team_info(&self, _team_id: &str, body: Value) -> BoxFuture<'static, Result<Value>> {
            Box::pin(future::ready(Ok(body)))
        }
    }

    fn bootstrap() -> Bootstrap {
        serde_json::from_value(serde_json::json!({
            "team": { "id": "acme", "url": "/teams/acme" },
            "people": [{ "name": "Dan", "tz": "America/New_York" }],
            "time": "2026-08-25T14:00:00Z",
            "csrf_token": "tok-1"
        }))
        .expect("bootstrap fixture deserializes")
    }

    fn controller_at(
        hour: u32,
        minute: u32,
    ) -> (
        Controller<RecordingRender, RecordingHistory, NullApi, Arc<FixedClock>>,
        RecordingRender,
        RecordingHistory,
        Arc<FixedClock>,
    ) {
        let clock = Arc::new(FixedClock::at(
            Utc.with_ymd_and_hms(2026, 8, 25, hour, minute, 42).unwrap(),
        ));
        let render = RecordingRender::default();
        let history = RecordingHistory::default();
        let controller = Controller::new(
            ControllerConfig::default(),
            bootstrap(),
            render.clone(),
            history.clone(),
            Arc::new(NullApi),
            clock.clone(),
        );
        (controller, render, history, clock)
    }

    #[test]
    fn sync_to_now_is_a_no_op_within_the_same_minute() {
        let (mut controller, render, _, _) = controller_at(14, 7);
        controller.sync_to_now();
        assert_eq!(render.frame_count(), 1);
        // Same wall minute: no second render.
        controller.sync_to_now();
        assert_eq!(render.frame_count(), 1);
        assert!(controller.state().is_current_time);
    }

    #[test]
    fn scrub_anchors_at_now_and_snaps_to_the_quarter_hour() {
        let (mut controller, render, _, _) = controller_at(14, 7);
        controller.scrub_to_percent(0.5);
        let frame = render.last_frame().expect("scrub renders");
        assert_eq!(frame.time.to_rfc3339(), "2026-08-25T20:00:00+00:00");
        assert!(!frame.is_current_time);
        assert_eq!(controller.mode(), Mode::Manual);
    }

    #[test]
    fn scrub_is_not_cumulative() {
        let (mut controller, render, _, _) = controller_at(14, 7);
        controller.scrub_to_percent(0.5);
        controller.scrub_to_percent(0.5);
        // Both scrubs land on the same instant; a cumulative scrub would not.
        let frames = render.frames();
        assert_eq!(frames[frames.len() - 1].time, frames[frames.len() - 2].time);
    }

    #[test]
    fn scrub_zero_returns_to_the_present() {
        let (mut controller, _, _, _) = controller_at(14, 7);
        controller.scrub_to_percent(0.5);
        controller.scrub_to_percent(0.0);
        assert_eq!(controller.mode(), Mode::Auto);
        assert!(controller.state().is_current_time);
        assert_eq!(controller.state().time.to_rfc3339(), "2026-08-25T14:07:00+00:00");
    }

    #[test]
    fn out_of_range_scrubs_clamp() {
        let (mut controller, _, _, _) = controller_at(12, 0);
        controller.scrub_to_percent(7.5);
        // Clamped to +12h.
        assert_eq!(controller.state().time.to_rfc3339(), "2026-08-26T00:00:00+00:00");
    }

    #[test]
    fn arrow_keys_pin_the_scheduler_without_moving_time() {
        let (mut controller, render, _, _) = controller_at(14, 7);
        let before = controller.state().time;
        let outcome = controller.handle_arrow_key(ArrowKey::Right);
        assert_eq!(outcome, KeyOutcome::SuppressDefault);
        assert_eq!(controller.mode(), Mode::Manual);
        assert_eq!(controller.state().time, before);
        assert_eq!(render.frame_count(), 1);
    }

    #[test]
    fn focus_regained_syncs_only_in_auto() {
        let (mut controller, render, _, clock) = controller_at(14, 7);
        controller.handle_host_event(HostEvent::FocusRegained);
        assert_eq!(render.frame_count(), 1);

        controller.scrub_to_percent(0.25);
        let frames_after_scrub = render.frame_count();
        clock.set(Utc.with_ymd_and_hms(2026, 8, 25, 14, 9, 0).unwrap());
        controller.handle_host_event(HostEvent::FocusRegained);
        assert_eq!(render.frame_count(), frames_after_scrub);
    }

    #[test]
    fn navigation_round_trips_through_history() {
        let (mut controller, _, history, _) = controller_at(14, 7);
        controller.handle_intent(Intent::ShowModal("settings".into()));
        assert_eq!(history.last_path().as_deref(), Some("/teams/acme/settings"));
        assert_eq!(
            controller.state().current_view,
            View::Modal("settings".into())
        );
        let pushed = history.last_path().expect("pushed");
        assert_eq!(
            View::from_path(&controller.state().team.url, &pushed),
            View::Modal("settings".into())
        );

        controller.handle_intent(Intent::CloseModal);
        assert_eq!(history.last_path().as_deref(), Some("/teams/acme"));
        assert_eq!(controller.state().current_view, View::App);
    }

    #[test]
    fn popstate_never_re_pushes_history() {
        let (mut controller, _, history, _) = controller_at(14, 7);
        controller.handle_host_event(HostEvent::PopState("/teams/acme/invite".into()));
        assert_eq!(
            controller.state().current_view,
            View::Modal("invite".into())
        );
        assert!(history.paths().is_empty());
    }

    #[test]
    fn foreign_popstate_paths_show_the_base_view() {
        let (mut controller, _, _, _) = controller_at(14, 7);
        controller.handle_intent(Intent::ShowModal("settings".into()));
        controller.handle_host_event(HostEvent::PopState("/somewhere/else".into()));
        assert_eq!(controller.state().current_view, View::App);
    }

    #[test]
    fn changing_the_format_reprojects() {
        let (mut controller, _, _, _) = controller_at(14, 7);
        controller.sync_to_now();
        controller.handle_intent(Intent::ChangeTimeFormat(crate::state::TimeFormat::Hour24));
        // 14:07 UTC is 10:07 in New York.
        assert_eq!(controller.state().projections[0].local_time, "10:07");
    }

    #[tokio::test]
    async fn save_attaches_the_csrf_token() {
        let (controller, _, _, _) = controller_at(14, 7);
        let body = controller
            .save_team_info(serde_json::json!({ "name": "Acme" }))
            .await
            .expect("null api echoes the body");
        assert_eq!(body["_csrf"], "tok-1");
        assert_eq!(body["name"], "Acme");
    }

    #[tokio::test]
    async fn a_failing_save_leaves_the_state_untouched() {
        struct FailingApi;
        impl TeamApi for FailingApi {
            fn save_team_info(
                &self,
                _team_id: &str,
                _body: Value,
            ) -> BoxFuture<'static, Result<Value>> {
                Box::pin(future::ready(Err(anyhow!("boom"))))
            }
        }

        let clock = Arc::new(FixedClock::at(
            Utc.with_ymd_and_hms(2026, 8, 25, 14, 7, 0).unwrap(),
        ));
        let controller = Controller::new(
            ControllerConfig::default(),
            bootstrap(),
            RecordingRender::default(),
            RecordingHistory::default(),
            Arc::new(FailingApi),
            clock,
        );
        let view_before = controller.state().current_view.clone();
        let time_before = controller.state().time;

        let outcome = controller
            .save_team_info(serde_json::json!({ "name": "Acme" }))
            .await;
        assert!(outcome.is_err());
        assert_eq!(controller.state().current_view, view_before);
        assert_eq!(controller.state().time, time_before);
    }
}
