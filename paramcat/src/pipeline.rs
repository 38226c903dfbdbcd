//! Schema load followed by table export, for either backend.

use anyhow::{Context, Result};
use paramcat_core::{
    Backend, CatalogConfig, CatalogError, ExportSummary, MissingTablePolicy, SqliteExport, TableExport, TableName,
};
use std::fs;
use tracing::{info, warn};

use crate::report::Reporter;

pub fn run(cfg: &CatalogConfig, out: &Reporter) -> Result<ExportSummary> {
    let schema_sql = fs::read_to_string(&cfg.schema_file)
        .with_context(|| format!("reading schema {}", cfg.schema_file.display()))?;
    if !cfg.out_dir.as_os_str().is_empty() {
        fs::create_dir_all(&cfg.out_dir).with_context(|| format!("creating {}", cfg.out_dir.display()))?;
    }
    info!(backend = %cfg.backend, database = %cfg.database_path().display(), tables = cfg.tables.len(), "starting catalog build");
    match cfg.backend {
        Backend::Sqlite => run_sqlite(cfg, &schema_sql, out),
        Backend::Duckdb => run_duckdb(cfg, &schema_sql, out),
    }
}

fn run_sqlite(cfg: &CatalogConfig, schema_sql: &str, out: &Reporter) -> Result<ExportSummary> {
    out.line("Creating SQLite database from schema...");
    catalog_sqlite::Db::create_fresh(&cfg.sqlite_db, schema_sql)?;
    out.line(format!("✓ Created database: {}", cfg.sqlite_db.display()));

    out.line("\nExporting tables to Parquet files...");
    let mut summary = ExportSummary::new(Backend::Sqlite, &cfg.sqlite_db);
    for table in &cfg.tables {
        let path = cfg.parquet_path(table);
        // fresh connection per table
        let db = catalog_sqlite::Db::open_read_only(&cfg.sqlite_db)?;
        if !db.table_exists(table.as_str())? {
            db.close()?;
            handle_missing(cfg.on_missing, table, out, &mut summary)?;
            continue;
        }
        let rows = match cfg.sqlite_export {
            SqliteExport::Arrow => {
                let written = db.export_table_to_parquet(table, &path, cfg.compression)?;
                let rows = db.row_count(table)?;
                if written != rows {
                    warn!(%table, written, rows, "row count differs from rows written");
                }
                db.close()?;
                rows
            }
            SqliteExport::DuckdbScan => {
                db.close()?;
                catalog_duckdb::export_sqlite_table(&cfg.sqlite_db, table, &path, cfg.compression)?
            }
        };
        out.exported(table, rows, &path);
        summary.exported.push(TableExport { table: table.clone(), rows, path });
    }
    Ok(summary)
}

fn run_duckdb(cfg: &CatalogConfig, schema_sql: &str, out: &Reporter) -> Result<ExportSummary> {
    out.line("Creating DuckDB database from schema...");
    catalog_duckdb::Db::create_fresh(&cfg.duckdb_db, schema_sql)?;
    out.line(format!("✓ Created database: {}", cfg.duckdb_db.display()));

    out.line("\nExporting tables to Parquet files...");
    let mut summary = ExportSummary::new(Backend::Duckdb, &cfg.duckdb_db);
    // one read-only connection for the whole phase; Drop releases it on early return
    let db = catalog_duckdb::Db::open_read_only(&cfg.duckdb_db)?;
    for table in &cfg.tables {
        if !db.table_exists(table.as_str())? {
            handle_missing(cfg.on_missing, table, out, &mut summary)?;
            continue;
        }
        let path = cfg.parquet_path(table);
        db.export_table_to_parquet(table, &path, cfg.compression)?;
        let rows = db.row_count(table)?;
        out.exported(table, rows, &path);
        summary.exported.push(TableExport { table: table.clone(), rows, path });
    }
    db.close()?;
    Ok(summary)
}

fn handle_missing(policy: MissingTablePolicy, table: &TableName, out: &Reporter, summary: &mut ExportSummary) -> Result<()> {
    match policy {
        MissingTablePolicy::Skip => {
            warn!(%table, "table missing from schema, skipped");
            out.line(format!("⚠ Table '{table}' does not exist, skipping..."));
            summary.skipped.push(table.clone());
            Ok(())
        }
        MissingTablePolicy::Fail => Err(CatalogError::MissingTable(table.to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::OutputFormat;
    use std::path::Path;

    const SCHEMA: &str = "
        CREATE TABLE types (id INTEGER, name VARCHAR(32) NOT NULL);
        CREATE TABLE quantities (id INTEGER, name VARCHAR(32) NOT NULL);
        CREATE TABLE units (id INTEGER, symbol VARCHAR(8) NOT NULL, scale DOUBLE);
        INSERT INTO types VALUES (1, 'u8'), (2, 'f32');
        INSERT INTO quantities VALUES (1, 'voltage');
        INSERT INTO units VALUES (1, 'V', 1.0), (2, 'mV', 0.001), (3, 'kV', 1000.0);
    ";

    fn config(dir: &Path, backend: Backend) -> CatalogConfig {
        let schema_file = dir.join("schema_parameters.sql");
        fs::write(&schema_file, SCHEMA).unwrap();
        CatalogConfig {
            schema_file,
            sqlite_db: dir.join("parameters.db"),
            duckdb_db: dir.join("parameters_duckdb.db"),
            out_dir: dir.join("out"),
            backend,
            ..Default::default()
        }
    }

    fn quiet() -> Reporter {
        Reporter::new(OutputFormat::Json)
    }

    fn summary_rows(s: &ExportSummary) -> Vec<(&str, u64)> {
        s.exported.iter().map(|t| (t.table.as_str(), t.rows)).collect()
    }

    #[test]
    fn sqlite_backend_skips_missing_table_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), Backend::Sqlite);
        let summary = run(&cfg, &quiet()).unwrap();
        assert_eq!(summary_rows(&summary), vec![("types", 2), ("quantities", 1), ("units", 3)]);
        assert_eq!(summary.skipped, vec![TableName::new("mcu_parameters").unwrap()]);
        assert_eq!(summary.exported.iter().map(|t| t.rows).sum::<u64>(), 6);
        assert!(dir.path().join("out/units.parquet").exists());
        assert!(!dir.path().join("out/mcu_parameters.parquet").exists());
    }

    #[test]
    fn duckdb_backend_matches_sqlite_counts() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), Backend::Duckdb);
        let summary = run(&cfg, &quiet()).unwrap();
        assert_eq!(summary.backend, Backend::Duckdb);
        assert_eq!(summary.database, dir.path().join("parameters_duckdb.db"));
        assert_eq!(summary_rows(&summary), vec![("types", 2), ("quantities", 1), ("units", 3)]);
        assert!(!dir.path().join("parameters.db").exists());
    }

    #[test]
    fn fail_policy_stops_at_first_missing_table() {
        for backend in [Backend::Sqlite, Backend::Duckdb] {
            let dir = tempfile::tempdir().unwrap();
            let mut cfg = config(dir.path(), backend);
            cfg.on_missing = MissingTablePolicy::Fail;
            cfg.tables = ["types", "units_v2", "units"].iter().map(|t| TableName::new(*t).unwrap()).collect();

            let err = run(&cfg, &quiet()).unwrap_err();
            assert!(matches!(err.downcast_ref::<CatalogError>(), Some(CatalogError::MissingTable(t)) if t == "units_v2"));
            assert!(dir.path().join("out/types.parquet").exists());
            assert!(!dir.path().join("out/units.parquet").exists());
        }
    }

    #[test]
    fn malformed_schema_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), Backend::Sqlite);
        fs::write(&cfg.schema_file, "CREATE TABLE types (id INTEGER); CREATE TABL units;").unwrap();
        assert!(run(&cfg, &quiet()).is_err());
        assert!(cfg.sqlite_db.exists());
        assert!(!dir.path().join("out/types.parquet").exists());
    }
}
