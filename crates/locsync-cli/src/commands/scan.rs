use std::io::IsTerminal;

use locsync_domain::SegmentRecord;
use locsync_services::{Project, Segment};

pub fn run_scan(
    root: std::path::PathBuf,
    format: String,
    out: Option<std::path::PathBuf>,
) -> color_eyre::Result<()> {
    tracing::debug!(event = "scan_args", root = ?root, format = %format, out = ?out);

    let cfg = locsync_config::load_config().unwrap_or_default();
    let mut project = Project::load(&root, cfg.cache_capacity())?;
    let segments = project.all_segments();
    tracing::info!(event = "scan_done", assets = project.len(), segments = segments.len());

    match format.as_str() {
        "csv" => {
            if let Some(path) = out {
                let file = std::fs::File::create(&path)?;
                locsync_export_csv::write_csv(file, &segments)?;
                crate::ui_info!("CSV saved to {}", path.display());
            } else {
                if std::io::stdout().is_terminal() {
                    crate::ui_info!("writing CSV to stdout");
                }
                locsync_export_csv::write_csv(std::io::stdout().lock(), &segments)?;
            }
        }
        "json" => {
            let items: Vec<SegmentRecord> = segments.iter().map(record).collect();
            if let Some(path) = out {
                let file = std::fs::File::create(&path)?;
                serde_json::to_writer_pretty(file, &items)?;
                crate::ui_info!("JSON saved to {}", path.display());
            } else {
                serde_json::to_writer(std::io::stdout().lock(), &items)?;
            }
        }
        _ => {
            let limit = cfg.list_limit.unwrap_or(usize::MAX);
            let mut text = String::new();
            for s in segments.iter().take(limit) {
                text.push_str(&format!(
                    "{}:{} [{}] {} => {}\n",
                    s.file_name,
                    s.id,
                    s.status.as_str(),
                    s.source,
                    s.target
                ));
            }
            if segments.len() > limit {
                text.push_str(&format!("... {} more\n", segments.len() - limit));
            }
            match out {
                Some(path) => {
                    std::fs::write(&path, text)?;
                    crate::ui_info!("listing saved to {}", path.display());
                }
                None => print!("{text}"),
            }
            crate::ui_ok!("{} unit(s) in {} file(s)", segments.len(), project.len());
        }
    }
    Ok(())
}

pub(crate) fn record(s: &Segment) -> SegmentRecord {
    SegmentRecord {
        schema_version: crate::OUTPUT_SCHEMA_VERSION,
        file: s.file_name.clone(),
        id: s.id.clone(),
        source: s.source.clone(),
        target: s.target.clone(),
        status: s.status.as_str().to_string(),
        state: s.internal_state.clone(),
        tm_match: s.is_tm_match,
        translatable: s.is_translatable,
    }
}
