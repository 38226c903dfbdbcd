use crate::Db;
use anyhow::Result;
use tracing::debug;

impl Db {
    /// Run a schema script. Statements execute in order; a failure leaves the
    /// ones before it applied.
    pub fn execute_script(&self, sql: &str) -> Result<()> {
        debug!(bytes = sql.len(), "executing schema script");
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}
