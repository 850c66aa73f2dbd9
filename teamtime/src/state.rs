//! The single mutable application state every intent path funnels into.
//!
//! Exactly one [`AppState`] exists per controller. It is owned by the
//! controller loop, mutated in place, and handed by reference to the render
//! sink after every mutation. Nothing outside the controller mutates it.

use crate::time::truncate_to_minute;
use crate::views::View;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Display preference for projected times, independent of the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum TimeFormat {
    #[default]
    #[serde(rename = "12h", alias = "12")]
    Hour12,
    #[serde(rename = "24h", alias = "24")]
    Hour24,
}

impl TimeFormat {
    /// The strftime pattern used when projecting times for display.
    pub fn strftime(self) -> &'static str {
        match self {
            TimeFormat::Hour12 => "%-I:%M %p",
            TimeFormat::Hour24 => "%H:%M",
        }
    }

    /// Lenient decoder for the externally-sourced format value, which arrives
    /// either as a bare number (`12`, `24`) or a string (`"12h"`, `"24"`).
    pub fn from_wire(value: &Value) -> Option<TimeFormat> {
        match value {
            Value::Number(n) => match n.as_u64()? {
                12 => Some(TimeFormat::Hour12),
                24 => Some(TimeFormat::Hour24),
                _ => None,
            },
            Value::String(s) => match s.as_str() {
                "12" | "12h" => Some(TimeFormat::Hour12),
                "24" | "24h" => Some(TimeFormat::Hour24),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Team metadata, read-only within the controller core.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamInfo {
    #[serde(alias = "_id")]
    pub id: String,
    /// The team's canonical history path, e.g. `/teams/acme`.
    pub url: String,
}

/// One team member, carrying the IANA zone their local time is projected in.
#[derive(Debug, Clone, Deserialize)]
pub struct Person {
    pub name: String,
    pub tz: String,
}

/// A derived display row: one person's local rendering of the simulated time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub name: String,
    pub zone: String,
    pub local_time: String,
}

/// The startup snapshot handed to the controller exactly once.
#[derive(Debug, Clone, Deserialize)]
pub struct Bootstrap {
    pub team: TeamInfo,
    #[serde(default)]
    pub people: Vec<Person>,
    /// The initial simulated instant, RFC 3339.
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub time_format: TimeFormat,
    #[serde(default)]
    pub csrf_token: String,
}

/// The one application state instance. See the module docs for ownership.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The simulated instant shared by the whole team, in the reference zone.
    pub time: DateTime<Tz>,
    /// True iff the last time mutation came from the auto-update path.
    pub is_current_time: bool,
    pub time_format: TimeFormat,
    pub current_view: View,
    pub team: TeamInfo,
    pub people: Vec<Person>,
    /// Derived rows, always a pure function of `(time, people, time_format)`.
    pub projections: Vec<Projection>,
    pub csrf_token: String,
}

impl AppState {
    /// Builds the initial state from the bootstrap snapshot.
    ///
    /// The initial instant is truncated to the minute so that later
    /// hour/minute writes from the auto-update path never leave stray seconds.
    pub fn from_bootstrap(bootstrap: Bootstrap, zone: Tz) -> Self {
        let mut state = Self {
            time: truncate_to_minute(bootstrap.time.with_timezone(&zone)),
            is_current_time: true,
            time_format: bootstrap.time_format,
            current_view: View::App,
            team: bootstrap.team,
            people: bootstrap.people,
            projections: Vec::new(),
            csrf_token: bootstrap.csrf_token,
        };
        state.project();
        state
    }

    /// Recomputes `projections` from the current time, people, and format.
    ///
    /// Called after every mutation that touches one of those inputs; the rows
    /// are never edited directly anywhere else.
    pub fn project(&mut self) {
        self.projections = self
            .people
            .iter()
            .map(|person| {
                let zone: Tz = person.tz.parse().unwrap_or_else(|_| {
                    warn!(person = %person.name, tz = %person.tz,
                        "unknown timezone, projecting in the reference zone");
                    self.time.timezone()
                });
                let local = self.time.with_timezone(&zone);
                Projection {
                    name: person.name.clone(),
                    zone: zone.name().to_string(),
                    local_time: local.format(self.time_format.strftime()).to_string(),
                }
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Tz;

    fn bootstrap() -> Bootstrap {
        serde_json::from_value(serde_json::json!({
            "team": { "_id": "abc123", "url": "/teams/acme" },
            "people": [
                { "name": "Dan", "tz": "America/New_York" },
                { "name": "Noriko", "tz": "Asia/Tokyo" }
            ],
            "time": "2026-08-25T14:07:42Z",
            "csrf_token": "tok-1"
        }))
        .expect("bootstrap fixture deserializes")
    }

    #[test]
    fn bootstrap_truncates_seconds_and_projects_everyone() {
        let state = AppState::from_bootstrap(bootstrap(), Tz::UTC);
        assert_eq!(state.time.to_rfc3339(), "2026-08-25T14:07:00+00:00");
        assert!(state.is_current_time);
        assert_eq!(state.current_view, View::App);
        assert_eq!(state.projections.len(), 2);
        // 14:07 UTC is 10:07 in New York (EDT) and 23:07 in Tokyo.
        assert_eq!(state.projections[0].local_time, "10:07 AM");
        assert_eq!(state.projections[1].local_time, "11:07 PM");
    }

    #[test]
    fn projections_follow_the_time_format() {
        let mut state = AppState::from_bootstrap(bootstrap(), Tz::UTC);
        state.time_format = TimeFormat::Hour24;
        state.project();
        assert_eq!(state.projections[0].local_time, "10:07");
        assert_eq!(state.projections[1].local_time, "23:07");
    }

    #[test]
    fn an_unknown_zone_falls_back_to_the_reference_zone() {
        let mut boot = bootstrap();
        boot.people.push(Person {
            name: "Lost".into(),
            tz: "Mars/Olympus_Mons".into(),
        });
        let state = AppState::from_bootstrap(boot, Tz::UTC);
        assert_eq!(state.projections[2].zone, "UTC");
        assert_eq!(state.projections[2].local_time, "2:07 PM");
    }

    #[test]
    fn time_format_decodes_numbers_and_strings() {
        assert_eq!(
            TimeFormat::from_wire(&serde_json::json!(24)),
            Some(TimeFormat::Hour24)
        );
        assert_eq!(
            TimeFormat::from_wire(&serde_json::json!("12h")),
            Some(TimeFormat::Hour12)
        );
        assert_eq!(TimeFormat::from_wire(&serde_json::json!(13)), None);
        assert_eq!(TimeFormat::from_wire(&serde_json::json!(null)), None);
    }
}
