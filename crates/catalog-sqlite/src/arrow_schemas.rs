use crate::query::ColumnInfo;
use arrow::datatypes::{DataType, Field, Schema};

/// Arrow type for a declared SQLite column type, following SQLite's affinity rules.
pub fn arrow_type_for(decl_type: &str) -> DataType {
    let t = decl_type.to_ascii_uppercase();
    let has = |needle: &str| t.contains(needle);
    if has("BOOL") {
        DataType::Boolean
    } else if has("INT") {
        DataType::Int64
    } else if has("CHAR") || has("CLOB") || has("TEXT") {
        DataType::Utf8
    } else if has("BLOB") {
        DataType::Binary
    } else if has("REAL") || has("FLOA") || has("DOUB") {
        DataType::Float64
    } else if has("DATE") || has("TIME") || t.trim().is_empty() {
        DataType::Utf8
    } else {
        // NUMERIC, DECIMAL(p,s) and friends
        DataType::Float64
    }
}

pub fn table_schema(columns: &[ColumnInfo]) -> Schema {
    Schema::new(
        columns
            .iter()
            .map(|c| Field::new(&c.name, arrow_type_for(&c.decl_type), !c.not_null))
            .collect::<Vec<_>>(),
    )
}
