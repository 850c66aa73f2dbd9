//! The sub-view enum and its bidirectional mapping onto history paths.
//!
//! A view and the host's navigation path are kept in a bijective relationship:
//! the base view maps to the team's canonical path unchanged, and every modal
//! maps to the canonical path plus `/{modal}`.

use tracing::warn;

/// The currently visible sub-panel of the single-page surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// The base team view. Its path is the team's canonical path unchanged.
    App,
    /// An open modal, identified by its externally-defined id.
    Modal(String),
}

impl View {
    /// Decodes a view tag as delivered over the wire (`"app"` is the base view).
    pub fn from_tag(tag: &str) -> View {
        if tag.is_empty() || tag == "app" {
            View::App
        } else {
            View::Modal(tag.to_string())
        }
    }

    /// The wire tag for this view.
    pub fn as_tag(&self) -> &str {
        match self {
            View::App => "app",
            View::Modal(id) => id,
        }
    }

    /// Encodes this view as a history path under the team's canonical path.
    pub fn to_path(&self, team_url: &str) -> String {
        match self {
            View::App => team_url.to_string(),
            View::Modal(id) => format!("{team_url}/{id}"),
        }
    }

    /// Decodes a history path back into a view.
    ///
    /// A path outside the team's canonical prefix decodes to the base view;
    /// stale or foreign paths must never take the controller down.
    pub fn from_path(team_url: &str, path: &str) -> View {
        let Some(rest) = path.strip_prefix(team_url) else {
            warn!(%path, %team_url, "navigation path outside the team prefix, showing base view");
            return View::App;
        };
        let tag = rest.trim_start_matches('/');
        View::from_tag(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "/teams/acme";

    #[test]
    fn base_view_keeps_the_canonical_path() {
        assert_eq!(View::App.to_path(URL), "/teams/acme");
        assert_eq!(View::from_path(URL, "/teams/acme"), View::App);
    }

    #[test]
    fn modal_views_append_a_suffix() {
        let view = View::Modal("settings".into());
        assert_eq!(view.to_path(URL), "/teams/acme/settings");
        assert_eq!(View::from_path(URL, "/teams/acme/settings"), view);
    }

    #[test]
    fn every_view_round_trips_through_its_path() {
        for view in [View::App, View::Modal("settings".into()), View::Modal("invite".into())] {
            assert_eq!(View::from_path(URL, &view.to_path(URL)), view);
        }
    }

    #[test]
    fn foreign_paths_fall_back_to_the_base_view() {
        assert_eq!(View::from_path(URL, "/teams/other/settings"), View::App);
        assert_eq!(View::from_path(URL, "/login"), View::App);
    }

    #[test]
    fn a_bare_trailing_slash_is_the_base_view() {
        assert_eq!(View::from_path(URL, "/teams/acme/"), View::App);
    }
}
