//! Configuration for the controller.
//!
//! Deserializable with `serde` so the settings can live in a TOML file and be
//! loaded through the `config` crate, keeping polling speed and scrub policy
//! outside the application code.

use anyhow::Result;
use chrono_tz::Tz;
use serde::Deserialize;
use std::time::Duration;

/// Top-level controller settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ControllerConfig {
    /// Auto-mode polling period in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// The reference zone the simulated clock is kept in. Uses the string
    /// names from the IANA Time Zone Database (e.g. "America/New_York").
    #[serde(default = "default_timezone")]
    pub timezone: Tz,

    /// Whether scrub percents outside `[-1.0, 1.0]` clamp to the range.
    /// When false, out-of-range values pass through unchanged.
    #[serde(default = "default_clamp_scrub")]
    pub clamp_scrub: bool,

    /// Base URL for the team save endpoint.
    #[serde(default)]
    pub api_base: String,
}

impl ControllerConfig {
    /// Loads settings from a TOML file, falling back to the defaults above
    /// for anything the file omits.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// The polling period as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            timezone: default_timezone(),
            clamp_scrub: default_clamp_scrub(),
            api_base: String::new(),
        }
    }
}

// --- Default value functions for serde ---

fn default_poll_interval_secs() -> u64 {
    20
}

fn default_timezone() -> Tz {
    Tz::UTC
}

fn default_clamp_scrub() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_in_missing_fields() {
        let config: ControllerConfig = toml_from_str("");
        assert_eq!(config.poll_interval_secs, 20);
        assert_eq!(config.timezone, Tz::UTC);
        assert!(config.clamp_scrub);
    }

    #[test]
    fn fields_deserialize_from_toml() {
        let config: ControllerConfig = toml_from_str(
            r#"
            poll_interval_secs = 5
            timezone = "Asia/Tokyo"
            clamp_scrub = false
            api_base = "https://teamtime.example"
            "#,
        );
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.timezone, Tz::Asia__Tokyo);
        assert!(!config.clamp_scrub);
        assert_eq!(config.api_base, "https://teamtime.example");
    }

    fn toml_from_str(raw: &str) -> ControllerConfig {
        config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .expect("builds")
            .try_deserialize()
            .expect("deserializes")
    }
}
