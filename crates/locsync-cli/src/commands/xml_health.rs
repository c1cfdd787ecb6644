use locsync_services::HealthFilter;

pub fn run_xml_health(
    root: std::path::PathBuf,
    format: String,
    strict: bool,
    only: Vec<String>,
    except: Vec<String>,
) -> color_eyre::Result<()> {
    tracing::debug!(event = "xml_health_args", root = ?root, format = %format, only = ?only, except = ?except);

    let cfg = locsync_config::load_config().unwrap_or_default();
    let health_cfg = cfg.health.clone().unwrap_or_default();
    let strict = strict || health_cfg.strict.unwrap_or(false);
    let only = if only.is_empty() { health_cfg.only.unwrap_or_default() } else { only };
    let except = if except.is_empty() { health_cfg.except.unwrap_or_default() } else { except };
    let filter = HealthFilter::from_lists(&only, &except);

    let engine = super::open_engine(&root, &cfg, true)?;
    let report = engine.health(&filter);

    if format == "json" {
        serde_json::to_writer(std::io::stdout().lock(), &report)?;
        if strict && !report.issues.is_empty() {
            color_eyre::eyre::bail!("xmlhealth-issues");
        }
        return Ok(());
    }

    if report.issues.is_empty() {
        crate::ui_ok!("{} file(s) checked, no issues", report.checked);
    } else {
        for it in &report.issues {
            crate::ui_err!("[{}] {}: {}", it.category, it.path, it.error);
        }
        crate::ui_warn!("{} issue(s) in {} file(s) checked", report.issues.len(), report.checked);
        if strict {
            color_eyre::eyre::bail!("xmlhealth-issues");
        }
    }
    Ok(())
}
