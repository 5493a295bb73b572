//! Change summaries between snapshots.
//!
//! A recursive structural diff: paths present only on one side count as
//! added/removed files and contribute their full line count when they are
//! UTF-8 text; paths present on both sides are compared line by line when
//! both versions are UTF-8 text. The result is a summary for the notifier,
//! never a patch.

use buildwatch_core::{DiffSummary, Result};
use similar::{ChangeTag, TextDiff};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Compute the change summary between two directory roots.
///
/// Callers skip this entirely when `previous` does not exist (first-ever
/// build); passing a nonexistent root here is a caller bug and surfaces as
/// an empty previous side (everything counts as added).
pub fn diff_trees(previous: &Path, next: &Path) -> Result<DiffSummary> {
    let previous_files = collect_files(previous)?;
    let next_files = collect_files(next)?;

    let mut summary = DiffSummary::default();

    for rel in previous_files.difference(&next_files) {
        debug!(path = %rel.display(), "removed");
        summary.files_removed += 1;
        summary.lines_removed += text_line_count(&previous.join(rel))?;
    }
    for rel in next_files.difference(&previous_files) {
        debug!(path = %rel.display(), "added");
        summary.files_added += 1;
        summary.lines_added += text_line_count(&next.join(rel))?;
    }

    for rel in previous_files.intersection(&next_files) {
        let old = fs::read(previous.join(rel))?;
        let new = fs::read(next.join(rel))?;
        if old == new {
            continue;
        }

        // binary pairs contribute no line counts
        let (Ok(old_text), Ok(new_text)) =
            (String::from_utf8(old), String::from_utf8(new))
        else {
            continue;
        };

        let diff = TextDiff::from_lines(&old_text, &new_text);
        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Insert => summary.lines_added += 1,
                ChangeTag::Delete => summary.lines_removed += 1,
                ChangeTag::Equal => {}
            }
        }
    }

    Ok(summary)
}

/// Lines in a file that is wholly on one side. Binary files count zero.
fn text_line_count(path: &Path) -> Result<usize> {
    match String::from_utf8(fs::read(path)?) {
        Ok(text) => Ok(text.lines().count()),
        Err(_) => Ok(0),
    }
}

fn collect_files(root: &Path) -> Result<BTreeSet<PathBuf>> {
    let mut files = BTreeSet::new();
    if !root.exists() {
        return Ok(files);
    }
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(std::io::Error::other)?;
        if entry.file_type().is_file() {
            let rel = entry
                .path()
                .strip_prefix(root)
                .map_err(std::io::Error::other)?;
            files.insert(rel.to_path_buf());
        }
    }
    Ok(files)
}
