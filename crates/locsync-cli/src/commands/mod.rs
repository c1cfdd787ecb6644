pub mod check;
pub mod resolve;
pub mod scan;
pub mod schema;
pub mod search;
pub mod set_source;
pub mod suggest;
pub mod xml_health;

use std::path::{Path, PathBuf};

use locsync_config::LocSyncConfig;
use locsync_services::{FileStorage, MemoryStorage, Project, ResolutionEngine, Storage};

/// Directory for persisted project state: `storage_dir` from config, or `<root>/.locsync`.
pub(crate) fn storage_dir(root: &Path, cfg: &LocSyncConfig) -> PathBuf {
    match cfg.storage_dir.as_deref() {
        Some(dir) if Path::new(dir).is_absolute() => PathBuf::from(dir),
        Some(dir) => root.join(dir),
        None => root.join(".locsync"),
    }
}

/// Load the project under `root` into an engine. `ephemeral` keeps state in memory.
///
/// When no document is found under `root`, the asset list persisted by an earlier
/// run is used instead.
pub(crate) fn open_engine(
    root: &Path,
    cfg: &LocSyncConfig,
    ephemeral: bool,
) -> color_eyre::Result<ResolutionEngine> {
    let mut project = Project::load(root, cfg.cache_capacity())?;
    let storage: Box<dyn Storage> = if ephemeral {
        Box::new(MemoryStorage::new())
    } else {
        Box::new(FileStorage::new(storage_dir(root, cfg)))
    };
    if project.is_empty() {
        if let Some(restored) = Project::restore(storage.as_ref(), cfg.cache_capacity()) {
            tracing::info!(event = "project_restored", root = %root.display(), assets = restored.len());
            project = restored;
        }
    }
    Ok(ResolutionEngine::new(project, storage).with_target_lang(cfg.target_lang()))
}

/// Write the named assets back under `root`, optionally keeping a `.bak` copy.
pub(crate) fn write_assets(
    engine: &ResolutionEngine,
    root: &Path,
    names: &[String],
    backup: bool,
) -> color_eyre::Result<()> {
    for name in names {
        let Some(idx) = engine.project().position(name) else {
            continue;
        };
        let path = root.join(name);
        if backup && path.exists() {
            let bak = backup_path(&path);
            std::fs::copy(&path, &bak)?;
            tracing::warn!(event = "backup_written", from = %path.display(), to = %bak.display());
        }
        std::fs::write(&path, engine.project().assets()[idx].content())?;
        tracing::debug!(event = "asset_written", path = %path.display());
    }
    Ok(())
}

pub(crate) fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}
