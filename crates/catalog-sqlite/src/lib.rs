//! SQLite side of the parameter catalog: build the database from a schema
//! script and stream its tables into Parquet through Arrow.

mod open;
mod query;
mod schema;
pub mod arrow_schemas;
mod export_parquet;

pub use open::Db;
pub use query::ColumnInfo;
