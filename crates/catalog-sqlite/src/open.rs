use anyhow::{Context, Result};
use paramcat_core::remove_database_files;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use tracing::debug;

/// Sidecar files SQLite may leave next to the database.
const SIDECARS: [&str; 3] = ["-journal", "-wal", "-shm"];

pub struct Db {
    pub conn: Connection,
}

impl Db {
    /// Delete whatever lives at `path`, create a new database there and run
    /// `schema_sql` as one multi-statement batch.
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
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX)
            .with_context(|| format!("opening {} read-only", path.display()))?;
        Ok(Db { conn })
    }

    /// Close explicitly so a failing close is reported instead of swallowed by `Drop`.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e)?;
        Ok(())
    }
}
