use anyhow::{Context, Result};
use paramcat_core::{Backend, CatalogConfig, Compression, MissingTablePolicy, SqliteExport, TableName};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "paramcat.yaml";

/// Optional settings read from YAML. Anything left out keeps its default.
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub schema: Option<PathBuf>,
    pub sqlite_db: Option<PathBuf>,
    pub duckdb_db: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub backend: Option<Backend>,
    pub tables: Option<Vec<TableName>>,
    pub on_missing: Option<MissingTablePolicy>,
    pub sqlite_export: Option<SqliteExport>,
    pub compression: Option<Compression>,
}

impl FileConfig {
    pub fn apply(self, cfg: &mut CatalogConfig) {
        if let Some(v) = self.schema { cfg.schema_file = v; }
        if let Some(v) = self.sqlite_db { cfg.sqlite_db = v; }
        if let Some(v) = self.duckdb_db { cfg.duckdb_db = v; }
        if let Some(v) = self.out_dir { cfg.out_dir = v; }
        if let Some(v) = self.backend { cfg.backend = v; }
        if let Some(v) = self.tables { cfg.tables = v; }
        if let Some(v) = self.on_missing { cfg.on_missing = v; }
        if let Some(v) = self.sqlite_export { cfg.sqlite_export = v; }
        if let Some(v) = self.compression { cfg.compression = v; }
    }
}

/// Load `path`, or `./paramcat.yaml` when no path is given and that file exists.
/// An explicit path that cannot be read or parsed is an error.
pub fn load_config(path: Option<&Path>) -> Result<Option<FileConfig>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = Path::new(DEFAULT_CONFIG_FILE);
            if p.exists() { p.to_path_buf() } else { return Ok(None); }
        }
    };
    let s = fs::read_to_string(&path).with_context(|| format!("reading config {}", path.display()))?;
    if s.trim().is_empty() {
        return Ok(Some(FileConfig::default()));
    }
    let cfg = serde_yaml::from_str(&s).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(Some(cfg))
}
