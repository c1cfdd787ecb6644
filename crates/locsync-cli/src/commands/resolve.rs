use locsync_domain::ResolveSummary;
use locsync_parsers_xml::normalize;

#[allow(clippy::too_many_arguments)]
pub fn run_resolve(
    root: std::path::PathBuf,
    source: String,
    canonical: Option<String>,
    pick: Option<usize>,
    dry_run: bool,
    backup: bool,
    format: String,
) -> color_eyre::Result<()> {
    tracing::debug!(
        event = "resolve_args",
        root = ?root,
        source = %source,
        canonical = ?canonical,
        pick = ?pick,
        dry_run = dry_run,
        backup = backup
    );

    let cfg = locsync_config::load_config().unwrap_or_default();
    let backup = backup || cfg.resolve.as_ref().and_then(|r| r.backup).unwrap_or(false);
    let key = normalize(&source);
    if key.is_empty() {
        color_eyre::eyre::bail!("resolve-empty-source");
    }

    let mut engine = super::open_engine(&root, &cfg, dry_run)?;
    engine.analyze();

    let (outcome, text) = match (pick, canonical) {
        (Some(0), _) => color_eyre::eyre::bail!("--pick is 1-based"),
        (Some(n), _) => {
            let outcome = engine.apply_manual(&key, n - 1)?;
            let text = outcome
                .updated
                .first()
                .map(|s| s.target.clone())
                .unwrap_or_default();
            (outcome, text)
        }
        (None, Some(text)) => (engine.apply(&key, &text), text),
        (None, None) => color_eyre::eyre::bail!("either --canonical or --pick is required"),
    };

    if !dry_run {
        super::write_assets(&engine, &root, &outcome.changed_assets, backup)?;
        if !outcome.persisted {
            crate::ui_warn!("project state could not be saved; files were still written");
        }
    }

    let summary = ResolveSummary {
        schema_version: crate::OUTPUT_SCHEMA_VERSION,
        normalized_source: key,
        canonical: text,
        updated_segments: outcome.updated.len(),
        changed_files: outcome.changed_assets,
        dry_run,
        remaining_groups: engine.groups().len(),
    };

    if format == "json" {
        serde_json::to_writer(std::io::stdout().lock(), &summary)?;
        return Ok(());
    }

    for f in &summary.changed_files {
        println!("  {f}");
    }
    if summary.updated_segments == 0 {
        crate::ui_warn!("no translatable unit has source \"{}\"", source);
    } else if dry_run {
        crate::ui_ok!(
            "DRY-RUN: would set {} unit(s) in {} file(s) to \"{}\"",
            summary.updated_segments,
            summary.changed_files.len(),
            summary.canonical
        );
    } else {
        crate::ui_ok!(
            "Set {} unit(s) in {} file(s) to \"{}\"; {} group(s) left",
            summary.updated_segments,
            summary.changed_files.len(),
            summary.canonical,
            summary.remaining_groups
        );
    }
    Ok(())
}
