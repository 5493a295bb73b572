//! Structured-document merge.
//!
//! The extracted `TextAsset/` directory carries a `manifest.json` mapping
//! output document names to lists of source fragments:
//!
//! ```json
//! {"objects": [{"path": "assets/equip.xml"}, {"path": "assets/skins.xml"}],
//!  "grounds": [{"path": "assets/ground.xml"}]}
//! ```
//!
//! For each named output, the fragments' root-level child elements are
//! concatenated in listing order under the first fragment's root tag and
//! written to `xml/<name>.xml`. Elements are NOT deduplicated; repeated
//! listings produce repeated elements. That is the upstream contract, not a
//! bug to fix here.

use buildwatch_core::fsutil::write_with_parents;
use buildwatch_core::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Merge every document listed in `manifest_file`, reading fragments from
/// `<input_dir>/TextAsset/` and writing merged documents under
/// `<output_dir>/xml/`. Returns the paths written.
pub fn merge_documents(
    manifest_file: &Path,
    input_dir: &Path,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let manifest: serde_json::Value = serde_json::from_str(&fs::read_to_string(manifest_file)?)?;
    let Some(entries) = manifest.as_object() else {
        return Err(Error::archive("document manifest is not an object"));
    };

    let text_asset_dir = input_dir.join("TextAsset");
    let mut written = Vec::new();

    for (output_name, listing) in entries {
        let Some(listing) = listing.as_array() else {
            continue;
        };

        let mut fragment_paths = Vec::new();
        for item in listing {
            // non-object entries are silently skipped, as upstream does
            let Some(path) = item.get("path").and_then(|p| p.as_str()) else {
                continue;
            };
            let Some(file_name) = Path::new(path).file_name() else {
                continue;
            };
            if !file_name.to_string_lossy().ends_with("xml") {
                continue;
            }
            let fragment = text_asset_dir.join(file_name);
            if !fragment.is_file() {
                warn!(fragment = %fragment.display(), "listed fragment not found");
                continue;
            }
            fragment_paths.push(fragment);
        }

        if fragment_paths.is_empty() {
            continue;
        }

        debug!(output = %output_name, fragments = fragment_paths.len(), "merging");
        let merged = merge_fragments(&fragment_paths)?;

        let output_file = output_dir.join("xml").join(format!("{}.xml", output_name));
        write_with_parents(&output_file, merged)?;
        info!(
            "merged {} fragments into {}.xml",
            fragment_paths.len(),
            output_name
        );
        written.push(output_file);
    }

    Ok(written)
}

/// Concatenate the root-level child elements of each fragment, in order,
/// under the first fragment's root tag. No deduplication.
fn merge_fragments(fragments: &[PathBuf]) -> Result<String> {
    let mut root_tag: Option<String> = None;
    let mut body = String::new();

    for fragment in fragments {
        let text = fs::read_to_string(fragment)?;
        let doc = roxmltree::Document::parse(&text)
            .map_err(|e| Error::archive(format!("parsing {}: {}", fragment.display(), e)))?;
        let root = doc.root_element();
        if root_tag.is_none() {
            root_tag = Some(root.tag_name().name().to_string());
        }
        for child in root.children().filter(|n| n.is_element()) {
            let range = child.range();
            body.push_str(&text[range]);
            body.push('\n');
        }
    }

    let root_tag = root_tag.unwrap_or_else(|| "Merged".to_string());
    Ok(format!("<{}>\n{}</{}>", root_tag, body, root_tag))
}
