use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use locsync_consistency::{analyze, ConsistencyReport, InconsistencyGroup};
use locsync_core::{LocSyncError, Result, Segment};
use locsync_domain::HealthReport;
use locsync_parsers_xml::{normalize, write_source_by_id, write_target_by_source};

use crate::health::{health_check, HealthFilter};
use crate::project::Project;
use crate::recommend::{Recommendation, Recommender};
use crate::storage::{save_assets, Storage};

/// Outcome of an assisted request once the owner has accepted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionEvent {
    Ready {
        key: String,
        recommendation: Recommendation,
    },
    Failed {
        key: String,
        error: String,
    },
}

impl SuggestionEvent {
    pub fn key(&self) -> &str {
        match self {
            Self::Ready { key, .. } | Self::Failed { key, .. } => key,
        }
    }
}

/// What an apply changed.
#[derive(Debug, Clone, Default)]
pub struct ApplyOutcome {
    /// In-memory segments that received the canonical text.
    pub updated: Vec<Segment>,
    /// Names of assets whose content was rewritten.
    pub changed_assets: Vec<String>,
    /// Whether the asset list reached storage.
    pub persisted: bool,
}

struct AssistReply {
    key: String,
    ticket: u64,
    outcome: std::result::Result<Recommendation, String>,
}

/// Single owner of project state, the last analysis and assisted requests.
///
/// Worker threads only send replies; every state change happens on the
/// owner's thread when replies are drained.
pub struct ResolutionEngine {
    project: Project,
    storage: Box<dyn Storage>,
    recommender: Option<Arc<dyn Recommender>>,
    target_lang: String,
    groups: Vec<InconsistencyGroup>,
    score: u8,
    pending: HashMap<String, u64>,
    next_ticket: u64,
    suggestions: HashMap<String, Recommendation>,
    tx: Sender<AssistReply>,
    rx: Receiver<AssistReply>,
}

impl ResolutionEngine {
    pub fn new(project: Project, storage: Box<dyn Storage>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            project,
            storage,
            recommender: None,
            target_lang: locsync_config::DEFAULT_TARGET_LANG.to_string(),
            groups: Vec::new(),
            score: 100,
            pending: HashMap::new(),
            next_ticket: 0,
            suggestions: HashMap::new(),
            tx,
            rx,
        }
    }

    pub fn with_recommender(mut self, recommender: Arc<dyn Recommender>) -> Self {
        self.recommender = Some(recommender);
        self
    }

    pub fn with_target_lang(mut self, lang: impl Into<String>) -> Self {
        self.target_lang = lang.into();
        self
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn project_mut(&mut self) -> &mut Project {
        &mut self.project
    }

    /// Groups from the last [`analyze`](Self::analyze), minus resolved ones.
    pub fn groups(&self) -> &[InconsistencyGroup] {
        &self.groups
    }

    pub fn group(&self, key: &str) -> Option<&InconsistencyGroup> {
        self.groups.iter().find(|g| g.normalized_source == key)
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    /// Full rescan of the project. Unchanged assets come from the cache.
    pub fn analyze(&mut self) -> ConsistencyReport {
        let segments = self.project.all_segments();
        let report = analyze(&segments);
        self.groups = report.groups.clone();
        self.score = report.score;
        tracing::info!(
            event = "analysis_done",
            assets = self.project.len(),
            segments = segments.len(),
            groups = report.groups.len(),
            score = report.score
        );
        report
    }

    /// Start an assisted request for a group. Returns its ticket; any older
    /// request for the same group is superseded.
    pub fn request_suggestion(&mut self, key: &str) -> Result<u64> {
        let group = self
            .group(key)
            .ok_or_else(|| LocSyncError::UnknownGroup(key.to_string()))?;
        let recommender = self
            .recommender
            .clone()
            .ok_or_else(|| LocSyncError::Recommend("no recommender configured".into()))?;
        let source = group.source.clone();
        let variations = group.variation_texts();

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.pending.insert(key.to_string(), ticket);
        self.suggestions.remove(key);

        let tx = self.tx.clone();
        let lang = self.target_lang.clone();
        let key = key.to_string();
        tracing::debug!(event = "suggestion_requested", key = %key, ticket = ticket);
        std::thread::spawn(move || {
            let outcome = recommender
                .resolve(&source, &variations, &lang)
                .map_err(|e| e.to_string());
            // Receiver gone means the engine was dropped; nothing to report to.
            let _ = tx.send(AssistReply { key, ticket, outcome });
        });
        Ok(ticket)
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    /// Cancel a pending request; its reply will be dropped when it arrives.
    pub fn cancel_suggestion(&mut self, key: &str) -> bool {
        let cancelled = self.pending.remove(key).is_some();
        if cancelled {
            tracing::debug!(event = "suggestion_cancelled", key = %key);
        }
        cancelled
    }

    pub fn suggestion(&self, key: &str) -> Option<&Recommendation> {
        self.suggestions.get(key)
    }

    /// Drain replies that have already arrived.
    pub fn poll_suggestions(&mut self) -> Vec<SuggestionEvent> {
        let mut events = Vec::new();
        while let Ok(reply) = self.rx.try_recv() {
            events.extend(self.accept(reply));
        }
        events
    }

    /// Block until the request for `key` settles or `timeout` elapses.
    /// Replies for other groups received meanwhile are accepted as usual.
    pub fn wait_suggestion(&mut self, key: &str, timeout: Duration) -> Option<SuggestionEvent> {
        let deadline = Instant::now() + timeout;
        while self.is_pending(key) {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                tracing::warn!(event = "suggestion_timeout", key = %key);
                return None;
            }
            match self.rx.recv_timeout(left) {
                Ok(reply) => {
                    if let Some(ev) = self.accept(reply) {
                        if ev.key() == key {
                            return Some(ev);
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
        None
    }

    fn accept(&mut self, reply: AssistReply) -> Option<SuggestionEvent> {
        if self.pending.get(&reply.key) != Some(&reply.ticket) {
            tracing::debug!(event = "stale_suggestion_dropped", key = %reply.key, ticket = reply.ticket);
            return None;
        }
        self.pending.remove(&reply.key);
        match reply.outcome {
            Ok(recommendation) => {
                tracing::info!(event = "suggestion_ready", key = %reply.key);
                self.suggestions
                    .insert(reply.key.clone(), recommendation.clone());
                Some(SuggestionEvent::Ready {
                    key: reply.key,
                    recommendation,
                })
            }
            Err(error) => {
                tracing::warn!(event = "suggestion_failed", key = %reply.key, error = %error);
                Some(SuggestionEvent::Failed {
                    key: reply.key,
                    error,
                })
            }
        }
    }

    /// Propagate `canonical` to every translatable unit whose normalized
    /// source equals `key`, rewrite the affected assets and persist them.
    pub fn apply(&mut self, key: &str, canonical: &str) -> ApplyOutcome {
        let mut updated = Vec::new();
        for idx in 0..self.project.len() {
            for seg in self.project.segments_at(idx).iter() {
                if seg.is_translatable && normalize(&seg.source) == key {
                    let mut seg = seg.clone();
                    seg.apply_override(canonical);
                    updated.push(seg);
                }
            }
        }

        let mut changed_assets = Vec::new();
        for idx in 0..self.project.len() {
            let asset = &self.project.assets()[idx];
            if !asset.kind.is_translation_dialect() {
                continue;
            }
            let rewritten = write_target_by_source(asset.content(), key, canonical);
            let name = asset.name.clone();
            if self.project.replace_content(idx, rewritten) {
                changed_assets.push(name);
            }
        }

        let persisted = self.persist();
        self.groups.retain(|g| g.normalized_source != key);
        self.pending.remove(key);
        self.suggestions.remove(key);
        tracing::info!(
            event = "group_resolved",
            key = %key,
            segments = updated.len(),
            assets = changed_assets.len(),
            persisted = persisted
        );
        ApplyOutcome {
            updated,
            changed_assets,
            persisted,
        }
    }

    /// Apply one of the group's existing variations.
    pub fn apply_manual(&mut self, key: &str, variation: usize) -> Result<ApplyOutcome> {
        let group = self
            .group(key)
            .ok_or_else(|| LocSyncError::UnknownGroup(key.to_string()))?;
        let text = group
            .variations
            .get(variation)
            .map(|v| v.text.clone())
            .ok_or(LocSyncError::VariationOutOfRange {
                index: variation,
                len: group.variations.len(),
            })?;
        Ok(self.apply(key, &text))
    }

    /// Apply the accepted recommendation for a group.
    pub fn apply_suggestion(&mut self, key: &str) -> Result<ApplyOutcome> {
        let text = self
            .suggestions
            .get(key)
            .map(|r| r.recommendation.clone())
            .ok_or_else(|| LocSyncError::NoSuggestion(key.to_string()))?;
        Ok(self.apply(key, &text))
    }

    /// Correct the source text of one unit, addressed by asset and unit id.
    /// Returns whether the asset changed.
    pub fn set_source(&mut self, asset: &str, unit_id: &str, text: &str) -> Result<bool> {
        let idx = self
            .project
            .position(asset)
            .ok_or_else(|| LocSyncError::UnknownAsset(asset.to_string()))?;
        let rewritten = write_source_by_id(self.project.assets()[idx].content(), unit_id, text);
        let changed = self.project.replace_content(idx, rewritten);
        if changed {
            self.persist();
        }
        tracing::info!(event = "source_set", asset = %asset, unit = %unit_id, changed = changed);
        Ok(changed)
    }

    pub fn search(&mut self, query: &str) -> Vec<Segment> {
        crate::search::search(&mut self.project, query)
    }

    pub fn health(&self, filter: &HealthFilter) -> HealthReport {
        health_check(self.project.assets(), filter)
    }

    /// Write the asset list to storage. A failure is logged and leaves the
    /// in-memory state authoritative.
    pub fn persist(&self) -> bool {
        let ok = save_assets(self.storage.as_ref(), self.project.assets());
        if !ok {
            tracing::warn!(event = "persist_failed", assets = self.project.len());
        }
        ok
    }
}
