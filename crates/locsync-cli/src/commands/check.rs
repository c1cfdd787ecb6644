use locsync_domain::{CheckReport, GroupRecord, VariationRecord};
use locsync_services::InconsistencyGroup;

pub fn run_check(
    root: std::path::PathBuf,
    format: String,
    strict: bool,
    use_color: bool,
) -> color_eyre::Result<()> {
    tracing::debug!(event = "check_args", root = ?root, format = %format, strict = strict);

    let cfg = locsync_config::load_config().unwrap_or_default();
    let strict = strict || cfg.check.as_ref().and_then(|c| c.strict).unwrap_or(false);
    let mut engine = super::open_engine(&root, &cfg, false)?;
    let segments = engine.project_mut().all_segments().len();
    let report = engine.analyze();
    engine.persist();

    let out = CheckReport {
        schema_version: crate::OUTPUT_SCHEMA_VERSION,
        assets: engine.project().len(),
        segments,
        score: report.score,
        groups: report.groups.iter().map(group_record).collect(),
    };

    if format == "json" {
        serde_json::to_writer(std::io::stdout().lock(), &out)?;
        if strict && !out.groups.is_empty() {
            color_eyre::eyre::bail!("check-inconsistent");
        }
        return Ok(());
    }

    let limit = cfg.list_limit.unwrap_or(usize::MAX);
    for g in out.groups.iter().take(limit) {
        print_group(g, use_color);
    }
    if out.groups.len() > limit {
        println!("... {} more group(s)", out.groups.len() - limit);
    }

    if out.groups.is_empty() {
        crate::ui_ok!(
            "No inconsistencies in {} unit(s) across {} file(s); score {}",
            out.segments,
            out.assets,
            out.score
        );
    } else {
        crate::ui_warn!(
            "{} inconsistent group(s); score {}",
            out.groups.len(),
            out.score
        );
        if strict {
            color_eyre::eyre::bail!("check-inconsistent");
        }
    }
    Ok(())
}

pub(crate) fn group_record(g: &InconsistencyGroup) -> GroupRecord {
    GroupRecord {
        normalized_source: g.normalized_source.clone(),
        source: g.source.clone(),
        variations: g
            .variations
            .iter()
            .map(|v| VariationRecord {
                text: v.text.clone(),
                files: v.file_names.clone(),
                segments: v.segments.len(),
            })
            .collect(),
        affected_files: g.affected_file_names.clone(),
        tm_conflict: g.has_tm_conflict,
    }
}

fn print_group(g: &GroupRecord, use_color: bool) {
    let conflict = if g.tm_conflict { " [tm-conflict]" } else { "" };
    if use_color {
        use owo_colors::OwoColorize;
        println!("{}{}", g.source.green(), conflict.yellow());
        for (i, v) in g.variations.iter().enumerate() {
            println!(
                "  {}. {} ({})",
                (i + 1).to_string().magenta(),
                v.text,
                v.files.join(", ").blue()
            );
        }
    } else {
        println!("{}{}", g.source, conflict);
        for (i, v) in g.variations.iter().enumerate() {
            println!("  {}. {} ({})", i + 1, v.text, v.files.join(", "));
        }
    }
}
