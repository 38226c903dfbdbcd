use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Schema file '{}' not found!", .0.display())]
    SchemaNotFound(PathBuf),
    #[error("invalid table name '{0}': only ASCII letters, digits and '_' are allowed")]
    InvalidTableName(String),
    #[error("table '{0}' does not exist")]
    MissingTable(String),
}
