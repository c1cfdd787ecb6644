//! XLIFF-family markup handling: unit extraction, source normalization and
//! in-place write-back.

use std::path::Path;

use locsync_core::{Asset, DocumentKind, Result};
use walkdir::WalkDir;

pub mod extract;
pub mod markup;
pub mod normalize;
mod units;
pub mod writeback;

pub use extract::{extract_asset, extract_segments};
pub use normalize::normalize;
pub use writeback::{write_source_by_id, write_target_by_id, write_target_by_source};

/// Walk `root` and load every file with a recognized dialect extension as an asset.
/// Asset id and name are the path relative to `root` with `/` separators.
pub fn load_assets(root: &Path) -> Result<Vec<Asset>> {
    let mut out: Vec<Asset> = Vec::new();

    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let kind = DocumentKind::from_path(path);
        if !kind.is_translation_dialect() {
            continue;
        }
        match std::fs::read_to_string(path) {
            Ok(txt) => {
                let rel = relative_name(root, path);
                out.push(Asset::new(rel.clone(), rel, kind, txt));
            }
            Err(e) => tracing::warn!(event = "asset_read_failed", path = %path.display(), error = %e),
        }
    }

    out.sort_by(|a, b| a.id.cmp(&b.id));
    tracing::debug!(event = "assets_loaded", root = %root.display(), count = out.len());
    Ok(out)
}

/// Path of `path` under `root`, `/`-separated.
pub fn relative_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
