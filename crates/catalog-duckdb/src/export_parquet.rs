use anyhow::{Context, Result};
use paramcat_core::{sql_literal, Compression, TableName};
use std::path::Path;
use tracing::debug;

use crate::Db;

/// Paths are embedded in SQL text, so they must be valid UTF-8 as-is.
fn path_literal(path: &Path) -> Result<String> {
    let s = path.to_str().with_context(|| format!("path {} is not valid UTF-8", path.display()))?;
    Ok(sql_literal(s))
}

fn copy_statement(select: &str, out: &Path, compression: Compression) -> Result<String> {
    Ok(format!(
        "COPY ({}) TO {} (FORMAT PARQUET, COMPRESSION {})",
        select,
        path_literal(out)?,
        compression.duckdb_codec()
    ))
}

fn sqlite_scan(db: &Path, table: &TableName) -> Result<String> {
    Ok(format!("sqlite_scan({}, {})", path_literal(db)?, sql_literal(table.as_str())))
}

impl Db {
    /// Copy all rows of `table` into `out` with DuckDB's Parquet writer.
    pub fn export_table_to_parquet(&self, table: &TableName, out: &Path, compression: Compression) -> Result<()> {
        let sql = copy_statement(&format!("SELECT * FROM {}", table.quoted()), out, compression)?;
        debug!(%sql, "copying table");
        self.conn.execute_batch(&sql).with_context(|| format!("exporting table '{table}'"))?;
        Ok(())
    }

    /// Make the `sqlite_scan` table function available on this connection.
    pub fn load_sqlite_extension(&self) -> Result<()> {
        self.conn.execute_batch("INSTALL sqlite; LOAD sqlite;").context("loading the DuckDB sqlite extension")?;
        Ok(())
    }

    /// Copy a table of a SQLite file into Parquet through `sqlite_scan`.
    /// Requires [`Db::load_sqlite_extension`] on this connection.
    pub fn export_sqlite_table_to_parquet(&self, sqlite_db: &Path, table: &TableName, out: &Path, compression: Compression) -> Result<()> {
        let sql = copy_statement(&format!("SELECT * FROM {}", sqlite_scan(sqlite_db, table)?), out, compression)?;
        debug!(%sql, "copying sqlite table");
        self.conn.execute_batch(&sql).with_context(|| format!("exporting table '{table}'"))?;
        Ok(())
    }

    pub fn sqlite_row_count(&self, sqlite_db: &Path, table: &TableName) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", sqlite_scan(sqlite_db, table)?);
        let n: i64 = self.conn.query_row(&sql, [], |r| r.get(0))?;
        Ok(n as u64)
    }
}

/// Export one SQLite table on a connection of its own, opened and closed here.
/// Returns the row count of the source table.
pub fn export_sqlite_table(sqlite_db: &Path, table: &TableName, out: &Path, compression: Compression) -> Result<u64> {
    let db = Db::open_in_memory()?;
    db.load_sqlite_extension()?;
    db.export_sqlite_table_to_parquet(sqlite_db, table, out, compression)?;
    let rows = db.sqlite_row_count(sqlite_db, table)?;
    db.close()?;
    Ok(rows)
}
