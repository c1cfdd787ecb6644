use std::sync::Arc;
use std::time::Duration;

use locsync_domain::SuggestionRecord;
use locsync_parsers_xml::normalize;
use locsync_services::recommend::DEFAULT_TIMEOUT_SECS;
use locsync_services::{HttpRecommender, SuggestionEvent};

#[allow(clippy::too_many_arguments)]
pub fn run_suggest(
    root: std::path::PathBuf,
    source: String,
    lang: Option<String>,
    timeout_secs: Option<u64>,
    apply: bool,
    backup: bool,
    format: String,
) -> color_eyre::Result<()> {
    tracing::debug!(
        event = "suggest_args",
        root = ?root,
        source = %source,
        lang = ?lang,
        timeout_secs = ?timeout_secs,
        apply = apply
    );

    let cfg = locsync_config::load_config().unwrap_or_default();
    let lang = lang.unwrap_or_else(|| cfg.target_lang().to_string());
    let timeout = timeout_secs
        .or(cfg.recommend.as_ref().and_then(|r| r.timeout_secs))
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    let backup = backup || cfg.resolve.as_ref().and_then(|r| r.backup).unwrap_or(false);
    let key = normalize(&source);

    let recommender = HttpRecommender::from_config(cfg.recommend.as_ref())?;
    let mut engine = super::open_engine(&root, &cfg, false)?
        .with_target_lang(lang)
        .with_recommender(Arc::new(recommender));
    engine.analyze();

    engine.request_suggestion(&key)?;
    crate::ui_info!("waiting for a recommendation (up to {timeout}s)");
    let recommendation = match engine.wait_suggestion(&key, Duration::from_secs(timeout)) {
        Some(SuggestionEvent::Ready { recommendation, .. }) => recommendation,
        Some(SuggestionEvent::Failed { error, .. }) => {
            crate::ui_err!("recommendation failed: {error}");
            color_eyre::eyre::bail!("suggest-failed");
        }
        None => {
            engine.cancel_suggestion(&key);
            color_eyre::eyre::bail!("suggest-timeout");
        }
    };

    let mut applied = false;
    if apply {
        let outcome = engine.apply_suggestion(&key)?;
        super::write_assets(&engine, &root, &outcome.changed_assets, backup)?;
        applied = true;
        crate::ui_ok!(
            "Applied to {} unit(s) in {} file(s)",
            outcome.updated.len(),
            outcome.changed_assets.len()
        );
    }

    let record = SuggestionRecord {
        schema_version: crate::OUTPUT_SCHEMA_VERSION,
        normalized_source: key,
        recommendation: recommendation.recommendation,
        reasoning: recommendation.reasoning,
        applied,
    };
    if format == "json" {
        serde_json::to_writer(std::io::stdout().lock(), &record)?;
    } else {
        println!("{}", record.recommendation);
        if !record.reasoning.is_empty() {
            println!("  {}", record.reasoning);
        }
    }
    Ok(())
}
