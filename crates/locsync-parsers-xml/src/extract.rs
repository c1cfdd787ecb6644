use locsync_core::{Asset, DocumentKind, Segment, DEFAULT_STATE};

use crate::units::scan_units;

/// Extract translation units from one document.
///
/// Fails soft: an unrecognized dialect or malformed markup yields an empty list.
pub fn extract_segments(content: &str, kind: DocumentKind, file_name: &str) -> Vec<Segment> {
    if !kind.is_translation_dialect() {
        return Vec::new();
    }
    let units = match scan_units(content) {
        Ok(units) => units,
        Err(e) => {
            tracing::warn!(event = "extract_failed", file = file_name, error = %e);
            return Vec::new();
        }
    };

    units
        .iter()
        .map(|u| {
            let state = u
                .target
                .as_ref()
                .and_then(|t| t.state.clone())
                .unwrap_or_else(|| DEFAULT_STATE.to_string());
            Segment::from_unit(
                u.effective_id(),
                u.source_text(content),
                u.target_text(content),
                state,
                u.match_quality.as_deref(),
                u.translatable,
                file_name.to_string(),
            )
        })
        .collect()
}

pub fn extract_asset(asset: &Asset) -> Vec<Segment> {
    extract_segments(asset.content(), asset.kind, &asset.name)
}
