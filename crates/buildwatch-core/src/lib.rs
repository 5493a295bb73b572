//! Core library for buildwatch: configuration, error taxonomy, domain types
//! and the on-disk layout shared by every pipeline stage.

pub mod config;
pub mod error;
pub mod fsutil;
pub mod paths;
pub mod state;
pub mod tools;
pub mod types;

pub use config::WatchConfig;
pub use error::{Error, Result};
pub use paths::{Layout, PairPaths};
pub use state::PublishedState;
pub use types::{
    BuildDescriptor, BuildType, DiffSummary, GateDecision, SkipReason, Snapshot, SnapshotId,
};
