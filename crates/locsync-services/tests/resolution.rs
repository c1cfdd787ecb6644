use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::eyre;
use locsync_services::{
    Asset, DocumentKind, LocSyncError, MemoryStorage, Project, Recommendation, Recommender,
    ResolutionEngine, Result, SegmentStatus, Storage, SuggestionEvent,
};

const A: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xliff version="1.2">
  <file original="checkout.json">
    <body>
      <trans-unit id="btn.submit">
        <source>Submit</source>
        <target state="final">Enviar</target>
      </trans-unit>
      <trans-unit id="btn.cancel">
        <source>Cancel</source>
        <target>Cancelar</target>
      </trans-unit>
    </body>
  </file>
</xliff>
"#;

const B: &str = r#"<xliff version="1.2">
  <file original="profile.json">
    <body>
      <trans-unit id="save">
        <source> submit </source>
        <target state="new">Confirmar</target>
      </trans-unit>
    </body>
  </file>
</xliff>
"#;

const C: &str = r#"<xliff><file><body><trans-unit id="x"><source>Help</source><target>Ayuda</target></trans-unit></body></file></xliff>"#;

struct Shared(Arc<MemoryStorage>);

impl Storage for Shared {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key)
    }
    fn set(&self, key: &str, value: &str) -> bool {
        self.0.set(key, value)
    }
}

struct Broken;

impl Storage for Broken {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }
    fn set(&self, _key: &str, _value: &str) -> bool {
        false
    }
}

fn assets() -> Vec<Asset> {
    vec![
        Asset::new("checkout.xlf", "checkout.xlf", DocumentKind::Xliff, A),
        Asset::new("profile.xlf", "profile.xlf", DocumentKind::Xliff, B),
        Asset::new("help.xlf", "help.xlf", DocumentKind::Xliff, C),
    ]
}

fn engine_with(storage: Box<dyn Storage>) -> ResolutionEngine {
    ResolutionEngine::new(Project::new(assets(), 16), storage).with_target_lang("es")
}

#[test]
fn submit_scenario_resolves_to_canonical_text() {
    let mem = Arc::new(MemoryStorage::new());
    let mut engine = engine_with(Box::new(Shared(Arc::clone(&mem))));

    let report = engine.analyze();
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.score, 95);
    let group = &report.groups[0];
    assert_eq!(group.normalized_source, "submit");
    assert!(group.has_tm_conflict);
    assert_eq!(group.variation_texts(), vec!["Enviar", "Confirmar"]);
    assert_eq!(group.affected_file_names, vec!["checkout.xlf", "profile.xlf"]);

    let out = engine.apply("submit", "Enviar");
    assert_eq!(out.updated.len(), 2);
    for seg in &out.updated {
        assert_eq!(seg.target, "Enviar");
        assert_eq!(seg.status, SegmentStatus::Translated);
        assert!(!seg.is_tm_match);
    }
    let approved_before = out.updated.iter().find(|s| s.id == "btn.submit").unwrap();
    assert_eq!(approved_before.file_name, "checkout.xlf");
    assert!(out.persisted);
    assert!(engine.groups().is_empty());

    let restored = Project::restore(mem.as_ref(), 4).expect("assets persisted");
    assert!(restored.assets()[1].content().contains(r#"<target state="translated">Enviar</target>"#));

    // Apply reports the override; the written `state="translated"` re-extracts as approved.
    for idx in 0..2 {
        let segs = engine.project_mut().segments_at(idx);
        let hit = segs.iter().find(|s| s.target == "Enviar").unwrap();
        assert_eq!(hit.internal_state, "translated");
        assert_eq!(hit.status, SegmentStatus::Approved);
        assert!(hit.is_tm_match);
    }
}

#[test]
fn propagation_round_trips_through_every_document() {
    let mut engine = engine_with(Box::new(MemoryStorage::new()));
    engine.analyze();
    engine.apply("submit", "Enviar ahora");

    let project = engine.project_mut();
    for idx in 0..2 {
        let segs = project.segments_at(idx);
        let hit = segs.iter().find(|s| s.source.trim() == "Submit" || s.source.trim() == "submit").unwrap();
        assert_eq!(hit.target, "Enviar ahora");
        assert_eq!(hit.internal_state, "translated");
    }
    // Untouched bytes survive.
    assert!(project.assets()[0].content().starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<xliff version=\"1.2\">"));
    assert!(project.assets()[0].content().contains("<target>Cancelar</target>"));
    assert_eq!(project.assets()[2].content(), C);
}

#[test]
fn storage_failure_does_not_abort_apply() {
    let mut engine = engine_with(Box::new(Broken));
    engine.analyze();
    let out = engine.apply("submit", "Enviar");
    assert!(!out.persisted);
    assert_eq!(out.changed_assets, vec!["checkout.xlf", "profile.xlf"]);
    assert_eq!(engine.analyze().groups.len(), 0);
}

#[test]
fn only_mutated_assets_are_re_extracted() {
    let mut engine = engine_with(Box::new(MemoryStorage::new()));
    engine.analyze();
    assert_eq!(engine.project().extractions(), 3);
    engine.analyze();
    assert_eq!(engine.project().extractions(), 3);

    engine.apply("submit", "Enviar");
    engine.analyze();
    assert_eq!(engine.project().extractions(), 5);
}

/// First call is slow and answers "first"; later calls answer "second" at once.
struct SlowThenFast {
    calls: AtomicUsize,
}

impl Recommender for SlowThenFast {
    fn resolve(&self, _source: &str, _variations: &[String], _lang: &str) -> Result<Recommendation> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let text = if n == 0 {
            std::thread::sleep(Duration::from_millis(150));
            "first"
        } else {
            "second"
        };
        Ok(Recommendation {
            recommendation: text.into(),
            reasoning: String::new(),
        })
    }
}

struct Failing;

impl Recommender for Failing {
    fn resolve(&self, _source: &str, _variations: &[String], _lang: &str) -> Result<Recommendation> {
        Err(eyre!("service unavailable"))
    }
}

#[test]
fn superseded_reply_is_dropped() {
    let mut engine = engine_with(Box::new(MemoryStorage::new()))
        .with_recommender(Arc::new(SlowThenFast { calls: AtomicUsize::new(0) }));
    engine.analyze();

    let t1 = engine.request_suggestion("submit").unwrap();
    let t2 = engine.request_suggestion("submit").unwrap();
    assert!(t2 > t1);

    let ev = engine.wait_suggestion("submit", Duration::from_secs(5)).unwrap();
    match ev {
        SuggestionEvent::Ready { recommendation, .. } => assert_eq!(recommendation.recommendation, "second"),
        other => panic!("unexpected {other:?}"),
    }

    std::thread::sleep(Duration::from_millis(400));
    assert!(engine.poll_suggestions().is_empty());
    assert_eq!(engine.suggestion("submit").unwrap().recommendation, "second");

    let out = engine.apply_suggestion("submit").unwrap();
    assert!(out.updated.iter().all(|s| s.target == "second"));
    assert!(engine.suggestion("submit").is_none());
}

#[test]
fn cancelled_request_is_ignored() {
    let mut engine = engine_with(Box::new(MemoryStorage::new()))
        .with_recommender(Arc::new(SlowThenFast { calls: AtomicUsize::new(0) }));
    engine.analyze();

    engine.request_suggestion("submit").unwrap();
    assert!(engine.cancel_suggestion("submit"));
    assert!(!engine.is_pending("submit"));

    std::thread::sleep(Duration::from_millis(400));
    assert!(engine.poll_suggestions().is_empty());
    assert!(engine.suggestion("submit").is_none());
}

#[test]
fn failed_request_clears_pending_flag() {
    let mut engine = engine_with(Box::new(MemoryStorage::new())).with_recommender(Arc::new(Failing));
    engine.analyze();

    engine.request_suggestion("submit").unwrap();
    assert!(engine.is_pending("submit"));
    let ev = engine.wait_suggestion("submit", Duration::from_secs(5)).unwrap();
    assert!(matches!(ev, SuggestionEvent::Failed { ref error, .. } if error.contains("unavailable")));
    assert!(!engine.is_pending("submit"));

    let err = engine.apply_suggestion("submit").unwrap_err();
    assert!(matches!(err.downcast_ref::<LocSyncError>(), Some(LocSyncError::NoSuggestion(_))));
    // The group is untouched and can still be resolved by hand.
    assert_eq!(engine.groups().len(), 1);
}
