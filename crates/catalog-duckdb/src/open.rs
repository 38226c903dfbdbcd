use anyhow::{Context, Result};
use duckdb::{AccessMode, Config, Connection};
use paramcat_core::remove_database_files;
use std::path::Path;
use tracing::debug;

const SIDECARS: [&str; 1] = [".wal"];

pub struct Db {
    pub conn: Connection,
}

impl Db {
    /// Delete whatever lives at `path`, create a new DuckDB database there and
    /// run `schema_sql` in a single batch execution.
    pub fn create_fresh(path: impl AsRef<Path>, schema_sql: &str) -> Result<()> {
        let path = path.as_ref();
        let removed = remove_database_files(path, &SIDECARS)
            .with_context(|| format!("removing old database {}", path.display()))?;
        if !removed.is_empty() {
            debug!(?removed, "removed previous database files");
        }
        let db = Db { conn: Connection::open(path)? };
        db.execute_script(schema_sql)?;
        db.close()
    }

    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = Config::default().access_mode(AccessMode::ReadOnly)?;
        let conn = Connection::open_with_flags(path, config)
            .with_context(|| format!("opening {} read-only", path.display()))?;
        Ok(Db { conn })
    }

    /// In-memory scratch database, used to scan foreign files.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Db { conn: Connection::open_in_memory()? })
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e)?;
        Ok(())
    }
}
