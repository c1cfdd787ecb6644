//! Cross-file consistency analysis over extracted segments.

pub mod index;
pub mod score;

pub use index::{find_inconsistencies, InconsistencyGroup, Variation};
pub use score::score;

use locsync_core::Segment;
use serde::Serialize;

/// Result of one full analysis pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsistencyReport {
    pub groups: Vec<InconsistencyGroup>,
    pub score: u8,
}

impl ConsistencyReport {
    pub fn group(&self, normalized_source: &str) -> Option<&InconsistencyGroup> {
        self.groups
            .iter()
            .find(|g| g.normalized_source == normalized_source)
    }
}

/// Group all segments and score the project.
pub fn analyze<'a, I>(segments: I) -> ConsistencyReport
where
    I: IntoIterator<Item = &'a Segment>,
{
    let groups = find_inconsistencies(segments);
    let score = score(groups.len());
    tracing::debug!(event = "consistency_analyzed", groups = groups.len(), score = score);
    ConsistencyReport { groups, score }
}
