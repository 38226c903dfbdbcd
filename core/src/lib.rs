//! Core types shared by the catalog loaders, the exporters, and the CLI.

mod config;
mod error;
mod report;

pub use config::*;
pub use error::CatalogError;
pub use report::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// A table name that is safe to splice into SQL text and file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    pub fn new(name: impl Into<String>) -> Result<Self, CatalogError> {
        let name = name.into();
        let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(CatalogError::InvalidTableName(name));
        }
        Ok(TableName(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Double-quoted identifier form for use in SQL.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }

    pub fn parquet_file_name(&self) -> String {
        format!("{}.parquet", self.0)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TableName {
    type Err = CatalogError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableName::new(s)
    }
}

impl TryFrom<String> for TableName {
    type Error = CatalogError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        TableName::new(s)
    }
}

impl From<TableName> for String {
    fn from(t: TableName) -> Self {
        t.0
    }
}

/// Delete a database file and any engine sidecars (`<db><suffix>`) left by an
/// earlier run. Returns the paths that were actually removed.
pub fn remove_database_files(path: &Path, sidecar_suffixes: &[&str]) -> io::Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    let mut candidates = vec![path.to_path_buf()];
    for suffix in sidecar_suffixes {
        let mut os = path.as_os_str().to_os_string();
        os.push(suffix);
        candidates.push(PathBuf::from(os));
    }
    for p in candidates {
        match std::fs::remove_file(&p) {
            Ok(()) => removed.push(p),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(removed)
}

/// Quote a string as a SQL literal.
pub fn sql_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
