use locsync_domain::SegmentRecord;

pub fn run_search(
    root: std::path::PathBuf,
    query: String,
    format: String,
    use_color: bool,
) -> color_eyre::Result<()> {
    tracing::debug!(event = "search_args", root = ?root, query = %query, format = %format);

    let cfg = locsync_config::load_config().unwrap_or_default();
    let mut engine = super::open_engine(&root, &cfg, true)?;
    let hits = engine.search(&query);

    if format == "json" {
        let items: Vec<SegmentRecord> = hits.iter().map(super::scan::record).collect();
        serde_json::to_writer(std::io::stdout().lock(), &items)?;
        return Ok(());
    }

    for s in &hits {
        if use_color {
            use owo_colors::OwoColorize;
            println!("{}:{} {} => {}", s.file_name.blue(), s.id.magenta(), s.source, s.target.green());
        } else {
            println!("{}:{} {} => {}", s.file_name, s.id, s.source, s.target);
        }
    }
    crate::ui_ok!("{} match(es)", hits.len());
    Ok(())
}
