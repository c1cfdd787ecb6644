use locsync_services::{Asset, DocumentKind, MemoryStorage, Project, ResolutionEngine};

pub fn run_set_source(
    file: std::path::PathBuf,
    id: String,
    text: String,
    backup: bool,
) -> color_eyre::Result<()> {
    tracing::debug!(event = "set_source_args", file = ?file, id = %id, backup = backup);

    let kind = DocumentKind::from_path(&file);
    if !kind.is_translation_dialect() {
        color_eyre::eyre::bail!("unsupported document type: {}", file.display());
    }
    let content = std::fs::read_to_string(&file)?;
    let name = file.display().to_string();
    let asset = Asset::new(name.clone(), name.clone(), kind, content);

    // The file on disk is the only state this command touches.
    let mut engine = ResolutionEngine::new(Project::new(vec![asset], 1), Box::new(MemoryStorage::new()));
    if !engine.set_source(&name, &id, &text)? {
        crate::ui_warn!("no unit with id \"{}\" in {}", id, file.display());
        return Ok(());
    }

    if backup {
        let bak = super::backup_path(&file);
        std::fs::copy(&file, &bak)?;
        tracing::warn!(event = "backup_written", from = %file.display(), to = %bak.display());
    }
    std::fs::write(&file, engine.project().assets()[0].content())?;
    crate::ui_ok!("Updated source of {} in {}", id, file.display());
    Ok(())
}
