//! Build descriptor monitoring and the build gate.

pub mod app_settings;
pub mod gate;

pub use app_settings::{parse_app_settings, AppSettings, SourceMonitor};
