use crate::{CatalogError, TableName};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_SCHEMA_FILE: &str = "schema_parameters.sql";
pub const DEFAULT_SQLITE_DB: &str = "parameters.db";
pub const DEFAULT_DUCKDB_DB: &str = "parameters_duckdb.db";
pub const DEFAULT_TABLES: [&str; 4] = ["types", "quantities", "units", "mcu_parameters"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Duckdb,
}

/// What to do when a configured table is absent from the database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingTablePolicy {
    #[default]
    Skip,
    Fail,
}

/// Engine that turns the SQLite file into Parquet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SqliteExport {
    #[default]
    Arrow,
    DuckdbScan,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Snappy,
    Zstd,
    None,
}

impl Compression {
    /// Codec name as DuckDB's `COPY ... (COMPRESSION x)` spells it.
    pub fn duckdb_codec(self) -> &'static str {
        match self {
            Compression::Snappy => "snappy",
            Compression::Zstd => "zstd",
            Compression::None => "uncompressed",
        }
    }
}

macro_rules! keyword_enum {
    ($ty:ty { $($kw:literal => $val:path),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($kw => Ok($val),)+
                    other => Err(format!("unknown value '{}', expected one of: {}", other, [$($kw),+].join(", "))),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(match self { $($val => $kw,)+ })
            }
        }
    };
}

keyword_enum!(Backend { "sqlite" => Backend::Sqlite, "duckdb" => Backend::Duckdb });
keyword_enum!(MissingTablePolicy { "skip" => MissingTablePolicy::Skip, "fail" => MissingTablePolicy::Fail });
keyword_enum!(SqliteExport { "arrow" => SqliteExport::Arrow, "duckdb-scan" => SqliteExport::DuckdbScan });
keyword_enum!(Compression { "snappy" => Compression::Snappy, "zstd" => Compression::Zstd, "none" => Compression::None });

/// Everything one run needs: input, outputs, table list and policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub schema_file: PathBuf,
    pub sqlite_db: PathBuf,
    pub duckdb_db: PathBuf,
    pub out_dir: PathBuf,
    pub backend: Backend,
    pub tables: Vec<TableName>,
    pub on_missing: MissingTablePolicy,
    pub sqlite_export: SqliteExport,
    pub compression: Compression,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            schema_file: PathBuf::from(DEFAULT_SCHEMA_FILE),
            sqlite_db: PathBuf::from(DEFAULT_SQLITE_DB),
            duckdb_db: PathBuf::from(DEFAULT_DUCKDB_DB),
            out_dir: PathBuf::from("."),
            backend: Backend::default(),
            tables: DEFAULT_TABLES.iter().map(|t| TableName(t.to_string())).collect(),
            on_missing: MissingTablePolicy::default(),
            sqlite_export: SqliteExport::default(),
            compression: Compression::default(),
        }
    }
}

impl CatalogConfig {
    /// Database file used by the selected backend.
    pub fn database_path(&self) -> &Path {
        match self.backend {
            Backend::Sqlite => &self.sqlite_db,
            Backend::Duckdb => &self.duckdb_db,
        }
    }

    /// `<out_dir>/<table>.parquet`, or the bare file name when writing to the
    /// working directory.
    pub fn parquet_path(&self, table: &TableName) -> PathBuf {
        if self.out_dir.as_os_str().is_empty() || self.out_dir == Path::new(".") {
            PathBuf::from(table.parquet_file_name())
        } else {
            self.out_dir.join(table.parquet_file_name())
        }
    }

    pub fn ensure_schema_exists(&self) -> Result<(), CatalogError> {
        if self.schema_file.is_file() {
            Ok(())
        } else {
            Err(CatalogError::SchemaNotFound(self.schema_file.clone()))
        }
    }
}
