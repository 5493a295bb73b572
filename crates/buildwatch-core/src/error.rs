//! Error types for buildwatch-core

use thiserror::Error;

/// Result type alias using buildwatch-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline error taxonomy.
///
/// Gate skips (`NoChange`, `UnavailableBuild`) are not errors and are modelled
/// on [`crate::types::GateDecision`] instead. Every variant here aborts the
/// current run; none of them mutates the published state.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration contents
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Build descriptor endpoint failure (fetch or parse)
    #[error("Build descriptor source error: {message}")]
    Source { message: String },

    /// Every asset acquisition strategy was exhausted
    #[error("Asset fetch failed for {build_url}: {message}")]
    Fetch { build_url: String, message: String },

    /// External tool exited nonzero or did not produce its expected output
    #[error("External tool '{tool}' failed: {message}")]
    Tool { tool: String, message: String },

    /// Filesystem error while materializing a snapshot
    #[error("Snapshot archive error: {message}")]
    Archive { message: String },

    /// Filesystem error while promoting a snapshot to current
    #[error("Publish error: {message}")]
    Publish { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a descriptor source error
    pub fn source(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
        }
    }

    /// Create a fetch error
    pub fn fetch(build_url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            build_url: build_url.into(),
            message: message.into(),
        }
    }

    /// Create an external tool error
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a snapshot archive error
    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive {
            message: message.into(),
        }
    }

    /// Create a publish error
    pub fn publish(message: impl Into<String>) -> Self {
        Self::Publish {
            message: message.into(),
        }
    }
}
