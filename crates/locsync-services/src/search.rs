use locsync_core::Segment;
use locsync_parsers_xml::normalize;

use crate::project::Project;

/// Segments whose normalized source or target contains the normalized query.
pub fn search(project: &mut Project, query: &str) -> Vec<Segment> {
    let needle = normalize(query);
    if needle.is_empty() {
        return Vec::new();
    }
    let mut hits = Vec::new();
    for idx in 0..project.len() {
        for seg in project.segments_at(idx).iter() {
            if normalize(&seg.source).contains(&needle) || normalize(&seg.target).contains(&needle) {
                hits.push(seg.clone());
            }
        }
    }
    tracing::debug!(event = "search_done", query = %needle, hits = hits.len());
    hits
}
