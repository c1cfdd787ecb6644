use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use locsync_core::Asset;

/// Key under which the asset list is persisted.
pub const ASSETS_KEY: &str = "locsync.assets";

/// Key/value persistence. Failures are logged by implementations and
/// reported as `None` / `false`; they never abort the caller.
pub trait Storage: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> bool;
}

/// One file per key under `dir`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file}.json"))
    }

    fn write_atomic(&self, path: &Path, value: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, path)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(s) => Some(s),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(event = "storage_read_failed", path = %path.display(), error = %e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> bool {
        let path = self.path_for(key);
        match self.write_atomic(&path, value) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(event = "storage_write_failed", path = %path.display(), error = %e);
                false
            }
        }
    }
}

/// In-process storage for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        match self.values.lock() {
            Ok(mut map) => {
                map.insert(key.to_string(), value.to_string());
                true
            }
            Err(_) => false,
        }
    }
}

/// Serialize the asset list under [`ASSETS_KEY`].
pub fn save_assets(storage: &dyn Storage, assets: &[Asset]) -> bool {
    let json = match serde_json::to_string(assets) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(event = "assets_serialize_failed", error = %e);
            return false;
        }
    };
    let ok = storage.set(ASSETS_KEY, &json);
    if ok {
        tracing::debug!(event = "assets_persisted", assets = assets.len(), bytes = json.len());
    }
    ok
}

pub fn load_assets(storage: &dyn Storage) -> Option<Vec<Asset>> {
    let json = storage.get(ASSETS_KEY)?;
    match serde_json::from_str::<Vec<Asset>>(&json) {
        Ok(assets) => Some(assets),
        Err(e) => {
            tracing::warn!(event = "assets_deserialize_failed", error = %e);
            None
        }
    }
}
