//! Host seams: the render sink, the history host, and the team save boundary.

pub mod api;
pub mod host;
