use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;

use locsync_core::{Asset, Result, Segment};
use locsync_parsers_xml::extract_asset;
use lru::LruCache;

use crate::storage::{self, Storage};

struct CachedTable {
    revision: u64,
    segments: Arc<Vec<Segment>>,
}

/// Loaded assets plus a per-asset segment table cache.
///
/// Cached tables are tagged with the asset's content revision. Replacing an
/// asset's content bumps its revision, so the next lookup re-extracts.
pub struct Project {
    assets: Vec<Asset>,
    revisions: Vec<u64>,
    cache: LruCache<String, CachedTable>,
    extractions: usize,
}

impl Project {
    pub fn new(assets: Vec<Asset>, cache_capacity: usize) -> Self {
        let cap = NonZeroUsize::new(cache_capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        let revisions = vec![0; assets.len()];
        Self {
            assets,
            revisions,
            cache: LruCache::new(cap),
            extractions: 0,
        }
    }

    /// Load every recognized document under `root`.
    pub fn load(root: &Path, cache_capacity: usize) -> Result<Self> {
        let assets = locsync_parsers_xml::load_assets(root)?;
        tracing::info!(event = "project_loaded", root = %root.display(), assets = assets.len());
        Ok(Self::new(assets, cache_capacity))
    }

    /// Rebuild a project from a previously persisted asset list.
    pub fn restore(storage: &dyn Storage, cache_capacity: usize) -> Option<Self> {
        storage::load_assets(storage).map(|assets| Self::new(assets, cache_capacity))
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Position of the asset whose id or name equals `key`.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.assets
            .iter()
            .position(|a| a.id == key)
            .or_else(|| self.assets.iter().position(|a| a.name == key))
    }

    /// Segments of the asset at `idx`, served from the cache when fresh.
    pub fn segments_at(&mut self, idx: usize) -> Arc<Vec<Segment>> {
        let asset = &self.assets[idx];
        let revision = self.revisions[idx];
        if let Some(entry) = self.cache.get(&asset.id) {
            if entry.revision == revision {
                return Arc::clone(&entry.segments);
            }
        }
        let segments = Arc::new(extract_asset(asset));
        self.extractions += 1;
        tracing::debug!(
            event = "segments_extracted",
            asset = %asset.id,
            revision = revision,
            segments = segments.len()
        );
        self.cache.put(
            asset.id.clone(),
            CachedTable {
                revision,
                segments: Arc::clone(&segments),
            },
        );
        segments
    }

    /// All segments of the project in asset order.
    pub fn all_segments(&mut self) -> Vec<Segment> {
        let mut out = Vec::new();
        for idx in 0..self.assets.len() {
            out.extend(self.segments_at(idx).iter().cloned());
        }
        out
    }

    /// Replace the content of the asset at `idx`. Returns `true` when the
    /// content changed and the cached table was invalidated.
    pub fn replace_content(&mut self, idx: usize, content: String) -> bool {
        if !self.assets[idx].replace_content(content) {
            return false;
        }
        self.revisions[idx] += 1;
        self.cache.pop(&self.assets[idx].id);
        true
    }

    /// Number of extractions performed so far; cache hits do not count.
    pub fn extractions(&self) -> usize {
        self.extractions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use locsync_core::DocumentKind;

    fn doc(target: &str) -> String {
        format!(
            r#"<xliff><file><body><trans-unit id="a"><source>Hello</source><target>{target}</target></trans-unit></body></file></xliff>"#
        )
    }

    #[test]
    fn unchanged_assets_are_served_from_cache() {
        let mut p = Project::new(
            vec![Asset::new("x.xlf", "x.xlf", DocumentKind::Xliff, doc("Hola"))],
            4,
        );
        assert_eq!(p.segments_at(0)[0].target, "Hola");
        assert_eq!(p.segments_at(0)[0].target, "Hola");
        assert_eq!(p.extractions(), 1);
    }

    #[test]
    fn mutation_invalidates_the_table() {
        let mut p = Project::new(
            vec![Asset::new("x.xlf", "x.xlf", DocumentKind::Xliff, doc("Hola"))],
            4,
        );
        p.all_segments();
        assert!(!p.replace_content(0, doc("Hola")));
        assert!(p.replace_content(0, doc("Buenas")));
        assert_eq!(p.segments_at(0)[0].target, "Buenas");
        assert_eq!(p.extractions(), 2);
    }

    #[test]
    fn position_matches_id_or_name() {
        let p = Project::new(
            vec![Asset::new("id-1", "ui/a.xlf", DocumentKind::Xliff, doc(""))],
            1,
        );
        assert_eq!(p.position("id-1"), Some(0));
        assert_eq!(p.position("ui/a.xlf"), Some(0));
        assert_eq!(p.position("nope"), None);
    }
}
