use crate::Db;
use anyhow::Result;
use paramcat_core::TableName;

/// A column as declared in the table definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub decl_type: String,
    pub not_null: bool,
}

impl Db {
    /// Table names compare case-insensitively, as SQLite resolves them.
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let cnt: i64 = self.conn.query_row(
            "SELECT COUNT(1) FROM sqlite_master WHERE type='table' AND lower(name) = lower(?)",
            [name],
            |r| r.get(0),
        )?;
        Ok(cnt > 0)
    }

    pub fn row_count(&self, table: &TableName) -> Result<u64> {
        let n: i64 = self.conn.query_row(&format!("SELECT COUNT(*) FROM {}", table.quoted()), [], |r| r.get(0))?;
        Ok(n as u64)
    }

    pub fn columns(&self, table: &TableName) -> Result<Vec<ColumnInfo>> {
        let mut stmt = self.conn.prepare("SELECT name, type, \"notnull\" FROM pragma_table_info(?) ORDER BY cid")?;
        let cols = stmt
            .query_map([table.as_str()], |r| {
                Ok(ColumnInfo { name: r.get(0)?, decl_type: r.get(1)?, not_null: r.get::<_, i64>(2)? != 0 })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cols)
    }
}
