use crate::Db;
use anyhow::Result;
use duckdb::params;
use paramcat_core::TableName;

impl Db {
    /// Identifiers are case-insensitive in DuckDB, so the lookup is too.
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let cnt: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE lower(table_name) = lower(?)",
            params![name],
            |r| r.get(0),
        )?;
        Ok(cnt > 0)
    }

    pub fn row_count(&self, table: &TableName) -> Result<u64> {
        let n: i64 = self.conn.query_row(&format!("SELECT COUNT(*) FROM {}", table.quoted()), [], |r| r.get(0))?;
        Ok(n as u64)
    }
}
