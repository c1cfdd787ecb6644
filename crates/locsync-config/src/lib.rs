use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const CONFIG_FILE: &str = "locsync.toml";
pub const DEFAULT_CACHE_CAPACITY: usize = 256;
pub const DEFAULT_TARGET_LANG: &str = "en";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocSyncConfig {
    pub target_lang: Option<String>,
    pub list_limit: Option<usize>,
    pub storage_dir: Option<String>,
    pub cache_capacity: Option<usize>,
    pub recommend: Option<RecommendCfg>,
    pub check: Option<CheckCfg>,
    pub resolve: Option<ResolveCfg>,
    pub health: Option<HealthCfg>,
    pub schema: Option<SchemaCfg>,
}

impl LocSyncConfig {
    pub fn target_lang(&self) -> &str {
        self.target_lang.as_deref().unwrap_or(DEFAULT_TARGET_LANG)
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
            .filter(|c| *c > 0)
            .unwrap_or(DEFAULT_CACHE_CAPACITY)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendCfg {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckCfg {
    pub strict: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolveCfg {
    pub backup: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthCfg {
    pub strict: Option<bool>,
    pub only: Option<Vec<String>>,
    pub except: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaCfg {
    pub out_dir: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{0}")]
    Other(String),
}

/// Search order: CWD/locsync.toml, then <config_dir>/locsync/locsync.toml.
pub fn load_config() -> Result<LocSyncConfig, ConfigError> {
    let mut paths = Vec::new();
    if let Ok(p) = std::env::current_dir() {
        paths.push(p.join(CONFIG_FILE));
    }
    if let Some(base) = dirs::config_dir() {
        paths.push(base.join("locsync").join(CONFIG_FILE));
    }
    load_from(&paths)
}

/// Merge the files that exist, earlier paths winning field by field.
pub fn load_from(paths: &[PathBuf]) -> Result<LocSyncConfig, ConfigError> {
    let mut merged = LocSyncConfig::default();
    for path in paths {
        if let Some(cfg) = read_file(path)? {
            merged = merge(merged, cfg);
        }
    }
    Ok(merged)
}

fn read_file(path: &Path) -> Result<Option<LocSyncConfig>, ConfigError> {
    let Ok(s) = std::fs::read_to_string(path) else {
        return Ok(None);
    };
    toml::from_str::<LocSyncConfig>(&s)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

fn merge(mut a: LocSyncConfig, b: LocSyncConfig) -> LocSyncConfig {
    if a.target_lang.is_none() {
        a.target_lang = b.target_lang;
    }
    if a.list_limit.is_none() {
        a.list_limit = b.list_limit;
    }
    if a.storage_dir.is_none() {
        a.storage_dir = b.storage_dir;
    }
    if a.cache_capacity.is_none() {
        a.cache_capacity = b.cache_capacity;
    }
    a.recommend = merge_opt(a.recommend, b.recommend, merge_recommend);
    a.check = merge_opt(a.check, b.check, merge_check);
    a.resolve = merge_opt(a.resolve, b.resolve, merge_resolve);
    a.health = merge_opt(a.health, b.health, merge_health);
    a.schema = merge_opt(a.schema, b.schema, merge_schema);
    a
}

fn merge_opt<T: Default>(a: Option<T>, b: Option<T>, f: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (None, Some(b)) => Some(b),
        (Some(a), None) => Some(a),
        (None, None) => None,
    }
}

fn merge_recommend(mut a: RecommendCfg, b: RecommendCfg) -> RecommendCfg {
    if a.endpoint.is_none() {
        a.endpoint = b.endpoint;
    }
    if a.model.is_none() {
        a.model = b.model;
    }
    if a.api_key_env.is_none() {
        a.api_key_env = b.api_key_env;
    }
    if a.timeout_secs.is_none() {
        a.timeout_secs = b.timeout_secs;
    }
    a
}
fn merge_check(mut a: CheckCfg, b: CheckCfg) -> CheckCfg {
    if a.strict.is_none() {
        a.strict = b.strict;
    }
    a
}
fn merge_resolve(mut a: ResolveCfg, b: ResolveCfg) -> ResolveCfg {
    if a.backup.is_none() {
        a.backup = b.backup;
    }
    a
}
fn merge_health(mut a: HealthCfg, b: HealthCfg) -> HealthCfg {
    if a.strict.is_none() {
        a.strict = b.strict;
    }
    if a.only.is_none() {
        a.only = b.only;
    }
    if a.except.is_none() {
        a.except = b.except;
    }
    a
}
fn merge_schema(mut a: SchemaCfg, b: SchemaCfg) -> SchemaCfg {
    if a.out_dir.is_none() {
        a.out_dir = b.out_dir;
    }
    a
}
