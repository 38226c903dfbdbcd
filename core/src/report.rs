use crate::{Backend, TableName};
use serde::Serialize;
use std::path::PathBuf;

/// One table written to Parquet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableExport {
    pub table: TableName,
    /// Row count as reported by `COUNT(*)` against the source.
    pub rows: u64,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub backend: Backend,
    pub database: PathBuf,
    pub exported: Vec<TableExport>,
    pub skipped: Vec<TableName>,
}

impl ExportSummary {
    pub fn new(backend: Backend, database: impl Into<PathBuf>) -> Self {
        ExportSummary { backend, database: database.into(), exported: Vec::new(), skipped: Vec::new() }
    }
}
