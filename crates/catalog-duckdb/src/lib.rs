//! DuckDB side of the parameter catalog: build a DuckDB database from a schema
//! script, and copy tables (native or scanned from SQLite) into Parquet.

mod open;
mod query;
mod schema;
mod export_parquet;

pub use open::Db;
pub use export_parquet::export_sqlite_table;
