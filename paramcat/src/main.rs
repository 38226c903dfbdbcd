use anyhow::Result;
use clap::Parser;
use paramcat_core::{Backend, CatalogConfig, Compression, MissingTablePolicy, SqliteExport, TableName};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod pipeline;
mod report;

use report::{OutputFormat, Reporter};

#[derive(Debug, Parser)]
#[command(name = "paramcat", version, about = "Build the parameter catalog database from a SQL schema and export its tables to Parquet")]
struct Cli {
    /// Build and export with DuckDB instead of SQLite
    #[arg(long)]
    duckdb: bool,
    /// Optional config file (YAML). If omitted, loads ./paramcat.yaml if present.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Schema script to run against the fresh database
    #[arg(long, value_name = "FILE")]
    schema: Option<PathBuf>,
    /// Directory for the <table>.parquet files
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,
    /// Table to export (repeatable). Replaces the default table list.
    #[arg(long = "table", value_name = "NAME")]
    tables: Vec<TableName>,
    /// What to do with a table the schema does not define: skip or fail
    #[arg(long, value_name = "POLICY")]
    on_missing: Option<MissingTablePolicy>,
    /// SQLite export engine: arrow or duckdb-scan
    #[arg(long, value_name = "ENGINE")]
    sqlite_export: Option<SqliteExport>,
    /// Parquet compression: snappy, zstd or none
    #[arg(long, value_name = "CODEC")]
    compression: Option<Compression>,
    /// Output format: text or json
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl Cli {
    /// Defaults, then the config file, then flags.
    fn resolve(&self) -> Result<CatalogConfig> {
        let mut cfg = CatalogConfig::default();
        if let Some(file) = config::load_config(self.config.as_deref())? {
            file.apply(&mut cfg);
        }
        if self.duckdb { cfg.backend = Backend::Duckdb; }
        if let Some(p) = &self.schema { cfg.schema_file = p.clone(); }
        if let Some(p) = &self.out_dir { cfg.out_dir = p.clone(); }
        if !self.tables.is_empty() { cfg.tables = self.tables.clone(); }
        if let Some(v) = self.on_missing { cfg.on_missing = v; }
        if let Some(v) = self.sqlite_export { cfg.sqlite_export = v; }
        if let Some(v) = self.compression { cfg.compression = v; }
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
    tracing::debug!(version = paramcat_core::version(), "paramcat starting");

    let cfg = cli.resolve()?;
    if let Err(e) = cfg.ensure_schema_exists() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let out = Reporter::new(cli.format);
    let summary = pipeline::run(&cfg, &out)?;
    out.finish(&summary)?;
    Ok(())
}
