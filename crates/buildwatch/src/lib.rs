//! Pipeline wiring and CLI surface for the buildwatch daemon.

pub mod cli;
pub mod pipeline;
