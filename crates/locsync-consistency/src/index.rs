use std::collections::{BTreeMap, BTreeSet};

use locsync_core::{Segment, SegmentStatus};
use locsync_parsers_xml::normalize;
use serde::Serialize;

/// One distinct target text observed for a normalized source.
#[derive(Debug, Clone, Serialize)]
pub struct Variation {
    pub text: String,
    pub file_names: Vec<String>,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InconsistencyGroup {
    pub normalized_source: String,
    /// Raw source of the first contributing segment.
    pub source: String,
    pub variations: Vec<Variation>,
    pub affected_file_names: Vec<String>,
    pub has_tm_conflict: bool,
}

impl InconsistencyGroup {
    pub fn variation_texts(&self) -> Vec<String> {
        self.variations.iter().map(|v| v.text.clone()).collect()
    }

    pub fn segment_count(&self) -> usize {
        self.variations.iter().map(|v| v.segments.len()).sum()
    }
}

#[derive(Default)]
struct Bucket {
    source: String,
    variations: Vec<Variation>,
}

impl Bucket {
    fn add(&mut self, text: &str, seg: &Segment) {
        if self.source.is_empty() {
            self.source = seg.source.clone();
        }
        let var = match self.variations.iter_mut().position(|v| v.text == text) {
            Some(i) => &mut self.variations[i],
            None => {
                self.variations.push(Variation {
                    text: text.to_string(),
                    file_names: Vec::new(),
                    segments: Vec::new(),
                });
                let last = self.variations.len() - 1;
                &mut self.variations[last]
            }
        };
        if !var.file_names.contains(&seg.file_name) {
            var.file_names.push(seg.file_name.clone());
        }
        var.segments.push(seg.clone());
    }
}

/// Group segments by normalized source and keep the keys with two or more
/// distinct non-empty targets.
pub fn find_inconsistencies<'a, I>(segments: I) -> Vec<InconsistencyGroup>
where
    I: IntoIterator<Item = &'a Segment>,
{
    let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();

    for seg in segments {
        if !seg.is_translatable || seg.source.is_empty() {
            continue;
        }
        let key = normalize(&seg.source);
        if key.is_empty() {
            continue;
        }
        let text = seg.target.trim();
        if text.is_empty() {
            continue;
        }
        buckets.entry(key).or_default().add(text, seg);
    }

    buckets
        .into_iter()
        .filter(|(_, b)| b.variations.len() >= 2)
        .map(|(key, b)| {
            let affected: BTreeSet<String> = b
                .variations
                .iter()
                .flat_map(|v| v.file_names.iter().cloned())
                .collect();
            let has_tm_conflict = b.variations.iter().flat_map(|v| &v.segments).any(|s| {
                s.is_tm_match || s.status == SegmentStatus::Approved
            });
            InconsistencyGroup {
                normalized_source: key,
                source: b.source,
                variations: b.variations,
                affected_file_names: affected.into_iter().collect(),
                has_tm_conflict,
            }
        })
        .collect()
}
