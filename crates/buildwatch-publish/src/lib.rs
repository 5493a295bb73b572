//! Snapshot archiving, change summaries, atomic publication and
//! notifications for buildwatch.

pub mod archive;
pub mod diff;
pub mod notify;
pub mod promote;

pub use archive::{archive_snapshot, BUILD_FILES_ARCHIVE, SNAPSHOT_METADATA};
pub use diff::diff_trees;
pub use notify::{Notification, Notifier};
pub use promote::{promote, store_in_history};
