use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, BinaryBuilder, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, SchemaRef};
use arrow::record_batch::RecordBatch;
use paramcat_core::{CatalogError, Compression, TableName};
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::basic::{Compression as Codec, ZstdLevel};
use parquet::file::properties::WriterProperties;
use rusqlite::types::ValueRef;
use rusqlite::Row;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::{arrow_schemas, Db};

const CHUNK: usize = 10_000;

fn writer_properties(compression: Compression) -> WriterProperties {
    let codec = match compression {
        Compression::Snappy => Codec::SNAPPY,
        Compression::Zstd => Codec::ZSTD(ZstdLevel::default()),
        Compression::None => Codec::UNCOMPRESSED,
    };
    WriterProperties::builder().set_compression(codec).build()
}

impl Db {
    /// Stream every row of `table` into a Parquet file at `out`, overwriting it.
    /// Returns the number of rows written.
    pub fn export_table_to_parquet(&self, table: &TableName, out: &Path, compression: Compression) -> Result<u64> {
        let columns = self.columns(table)?;
        if columns.is_empty() {
            return Err(CatalogError::MissingTable(table.to_string()).into());
        }
        let schema: SchemaRef = Arc::new(arrow_schemas::table_schema(&columns));

        let sql = format!("SELECT * FROM {}", table.quoted());
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let file = std::fs::File::create(out).with_context(|| format!("creating {}", out.display()))?;
        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(writer_properties(compression)))?;

        let mut written = 0u64;
        loop {
            let mut batch = RowBatch::new(&schema);
            let mut count = 0;
            while count < CHUNK {
                let Some(row) = rows.next()? else { break; };
                batch.push(row).with_context(|| format!("exporting table '{table}'"))?;
                count += 1;
            }
            if count == 0 { break; }
            let rb = RecordBatch::try_new(schema.clone(), batch.finish())?;
            writer.write(&rb)?;
            written += count as u64;
            debug!(%table, rows = count, "wrote record batch");
            if count < CHUNK { break; }
        }

        writer.close()?;
        Ok(written)
    }
}

/// Column builders for one record batch, one per field of the table schema.
struct RowBatch {
    names: Vec<String>,
    columns: Vec<ColumnBuilder>,
}

impl RowBatch {
    fn new(schema: &SchemaRef) -> Self {
        RowBatch {
            names: schema.fields().iter().map(|f| f.name().clone()).collect(),
            columns: schema.fields().iter().map(|f| ColumnBuilder::for_type(f.data_type())).collect(),
        }
    }

    fn push(&mut self, row: &Row) -> Result<()> {
        for (i, col) in self.columns.iter_mut().enumerate() {
            let v = row.get_ref(i)?;
            col.append(v).with_context(|| format!("column '{}'", self.names[i]))?;
        }
        Ok(())
    }

    fn finish(self) -> Vec<ArrayRef> {
        self.columns.into_iter().map(ColumnBuilder::finish).collect()
    }
}

enum ColumnBuilder {
    Boolean(BooleanBuilder),
    Int64(Int64Builder),
    Float64(Float64Builder),
    Utf8(StringBuilder),
    Binary(BinaryBuilder),
}

impl ColumnBuilder {
    fn for_type(dt: &DataType) -> Self {
        match dt {
            DataType::Boolean => ColumnBuilder::Boolean(BooleanBuilder::new()),
            DataType::Int64 => ColumnBuilder::Int64(Int64Builder::new()),
            DataType::Float64 => ColumnBuilder::Float64(Float64Builder::new()),
            DataType::Binary => ColumnBuilder::Binary(BinaryBuilder::new()),
            _ => ColumnBuilder::Utf8(StringBuilder::new()),
        }
    }

    fn append(&mut self, v: ValueRef<'_>) -> Result<()> {
        match (self, v) {
            (ColumnBuilder::Boolean(b), ValueRef::Null) => b.append_null(),
            (ColumnBuilder::Int64(b), ValueRef::Null) => b.append_null(),
            (ColumnBuilder::Float64(b), ValueRef::Null) => b.append_null(),
            (ColumnBuilder::Utf8(b), ValueRef::Null) => b.append_null(),
            (ColumnBuilder::Binary(b), ValueRef::Null) => b.append_null(),

            (ColumnBuilder::Boolean(b), ValueRef::Integer(i @ (0 | 1))) => b.append_value(i == 1),
            (ColumnBuilder::Boolean(b), ValueRef::Text(t)) => b.append_value(parse_bool(utf8(t)?)?),

            (ColumnBuilder::Int64(b), ValueRef::Integer(i)) => b.append_value(i),
            (ColumnBuilder::Int64(b), ValueRef::Real(f)) if fits_i64(f) => b.append_value(f as i64),
            (ColumnBuilder::Int64(b), ValueRef::Text(t)) => {
                let s = utf8(t)?.trim();
                b.append_value(s.parse::<i64>().with_context(|| format!("'{s}' is not an integer"))?)
            }

            (ColumnBuilder::Float64(b), ValueRef::Integer(i)) => b.append_value(i as f64),
            (ColumnBuilder::Float64(b), ValueRef::Real(f)) => b.append_value(f),
            (ColumnBuilder::Float64(b), ValueRef::Text(t)) => {
                let s = utf8(t)?.trim();
                b.append_value(s.parse::<f64>().with_context(|| format!("'{s}' is not a number"))?)
            }

            (ColumnBuilder::Utf8(b), ValueRef::Text(t)) => b.append_value(utf8(t)?),
            (ColumnBuilder::Utf8(b), ValueRef::Integer(i)) => b.append_value(i.to_string()),
            (ColumnBuilder::Utf8(b), ValueRef::Real(f)) => b.append_value(real_text(f)),

            (ColumnBuilder::Binary(b), ValueRef::Blob(bytes)) => b.append_value(bytes),
            (ColumnBuilder::Binary(b), ValueRef::Text(t)) => b.append_value(t),
            (ColumnBuilder::Binary(b), ValueRef::Integer(i)) => b.append_value(i.to_string()),
            (ColumnBuilder::Binary(b), ValueRef::Real(f)) => b.append_value(real_text(f)),

            (col, v) => bail!("cannot store {} value as {}", kind_of(v), col.type_name()),
        }
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        match self {
            ColumnBuilder::Boolean(_) => "Boolean",
            ColumnBuilder::Int64(_) => "Int64",
            ColumnBuilder::Float64(_) => "Float64",
            ColumnBuilder::Utf8(_) => "Utf8",
            ColumnBuilder::Binary(_) => "Binary",
        }
    }

    fn finish(self) -> ArrayRef {
        match self {
            ColumnBuilder::Boolean(mut b) => Arc::new(b.finish()),
            ColumnBuilder::Int64(mut b) => Arc::new(b.finish()),
            ColumnBuilder::Float64(mut b) => Arc::new(b.finish()),
            ColumnBuilder::Utf8(mut b) => Arc::new(b.finish()),
            ColumnBuilder::Binary(mut b) => Arc::new(b.finish()),
        }
    }
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    Ok(std::str::from_utf8(bytes)?)
}

/// Integral and inside the i64 range. `i64::MAX as f64` rounds up to 2^63,
/// hence the exclusive upper bound.
fn fits_i64(f: f64) -> bool {
    f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64
}

/// Text form of a REAL. Integral values keep their `.0` as in SQLite's own
/// conversion; very large or small magnitudes use Rust's exponent form
/// (`1e20`) where SQLite prints `1.0e+20`.
fn real_text(f: f64) -> String {
    format!("{f:?}")
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" => Ok(true),
        "0" | "f" | "false" | "no" => Ok(false),
        other => bail!("'{other}' is not a boolean"),
    }
}

fn kind_of(v: ValueRef<'_>) -> &'static str {
    match v {
        ValueRef::Null => "NULL",
        ValueRef::Integer(_) => "INTEGER",
        ValueRef::Real(_) => "REAL",
        ValueRef::Text(_) => "TEXT",
        ValueRef::Blob(_) => "BLOB",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, BooleanArray, Float64Array, Int64Array, StringArray};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    const SCHEMA: &str = r#"
        CREATE TABLE units (
            id      INTEGER PRIMARY KEY,
            symbol  TEXT NOT NULL,
            factor  REAL,
            si      BOOLEAN,
            note
        );
        INSERT INTO units VALUES (1, 'V', 1.0, 1, NULL);
        INSERT INTO units VALUES (2, 'mV', 0.001, 0, 'milli');
        INSERT INTO units VALUES (3, 'kHz', 1000, 'true', 42);
    "#;

    fn read_back(path: &Path) -> RecordBatch {
        let file = std::fs::File::open(path).unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(file).unwrap().build().unwrap();
        let batches: Vec<RecordBatch> = reader.map(|b| b.unwrap()).collect();
        arrow::compute::concat_batches(&batches[0].schema(), &batches).unwrap()
    }

    fn db_with(dir: &Path, sql: &str) -> Db {
        let path = dir.join("parameters.db");
        Db::create_fresh(&path, sql).unwrap();
        Db::open_read_only(&path).unwrap()
    }

    #[test]
    fn export_round_trips_rows_and_types() {
        let dir = tempfile::tempdir().unwrap();
        let db = db_with(dir.path(), SCHEMA);
        let out = dir.path().join("units.parquet");
        let table = TableName::new("units").unwrap();

        let written = db.export_table_to_parquet(&table, &out, Compression::Zstd).unwrap();
        assert_eq!(written, 3);
        assert_eq!(db.row_count(&table).unwrap(), 3);

        let batch = read_back(&out);
        assert_eq!(batch.num_rows(), 3);
        let schema = batch.schema();
        let types: Vec<&DataType> = schema.fields().iter().map(|f| f.data_type()).collect();
        assert_eq!(types, vec![&DataType::Int64, &DataType::Utf8, &DataType::Float64, &DataType::Boolean, &DataType::Utf8]);
        assert!(!schema.field(1).is_nullable());

        let ids = batch.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(ids.values().to_vec(), vec![1, 2, 3]);
        let symbols = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(symbols.value(2), "kHz");
        let factors = batch.column(2).as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(factors.value(2), 1000.0);
        let si = batch.column(3).as_any().downcast_ref::<BooleanArray>().unwrap();
        assert!(si.value(0) && !si.value(1) && si.value(2));
        let notes = batch.column(4).as_any().downcast_ref::<StringArray>().unwrap();
        assert!(notes.is_null(0));
        assert_eq!(notes.value(2), "42");
    }

    #[test]
    fn empty_table_writes_schema_only_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = db_with(dir.path(), "CREATE TABLE types (id INTEGER, name TEXT);");
        let out = dir.path().join("types.parquet");
        let written = db.export_table_to_parquet(&TableName::new("types").unwrap(), &out, Compression::Snappy).unwrap();
        assert_eq!(written, 0);

        let file = std::fs::File::open(&out).unwrap();
        let builder = ParquetRecordBatchReaderBuilder::try_new(file).unwrap();
        assert_eq!(builder.schema().fields().len(), 2);
        assert_eq!(builder.metadata().file_metadata().num_rows(), 0);
    }

    #[test]
    fn export_spans_multiple_batches() {
        let dir = tempfile::tempdir().unwrap();
        let sql = "CREATE TABLE mcu_parameters (id INTEGER, value REAL);
            WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 25000)
            INSERT INTO mcu_parameters SELECT n, n * 0.5 FROM seq;";
        let db = db_with(dir.path(), sql);
        let out = dir.path().join("mcu_parameters.parquet");
        let written = db.export_table_to_parquet(&TableName::new("mcu_parameters").unwrap(), &out, Compression::None).unwrap();
        assert_eq!(written, 25_000);
        assert_eq!(read_back(&out).num_rows(), 25_000);
    }

    #[test]
    fn mismatched_value_names_the_column() {
        let dir = tempfile::tempdir().unwrap();
        let db = db_with(dir.path(), "CREATE TABLE quantities (id INTEGER); INSERT INTO quantities VALUES ('seven');");
        let out = dir.path().join("quantities.parquet");
        let err = db.export_table_to_parquet(&TableName::new("quantities").unwrap(), &out, Compression::Snappy).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("quantities") && msg.contains("column 'id'"), "{msg}");
    }

    #[test]
    fn boolean_column_only_takes_zero_or_one() {
        let dir = tempfile::tempdir().unwrap();
        let db = db_with(dir.path(), "CREATE TABLE types (signed BOOLEAN); INSERT INTO types VALUES (1), (2);");
        let out = dir.path().join("types.parquet");
        let err = db.export_table_to_parquet(&TableName::new("types").unwrap(), &out, Compression::Snappy).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("column 'signed'") && msg.contains("cannot store INTEGER value as Boolean"), "{msg}");
    }

    #[test]
    fn out_of_range_real_is_not_clamped_into_int64() {
        let dir = tempfile::tempdir().unwrap();
        let db = db_with(dir.path(), "CREATE TABLE units (id INTEGER); INSERT INTO units VALUES (CAST(1e20 AS REAL));");
        let out = dir.path().join("units.parquet");
        let err = db.export_table_to_parquet(&TableName::new("units").unwrap(), &out, Compression::Snappy).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("column 'id'") && msg.contains("cannot store REAL value as Int64"), "{msg}");

        assert!(fits_i64(-9.223372036854775808e18));
        assert!(!fits_i64(9.223372036854775808e18));
        assert!(!fits_i64(f64::NAN) && !fits_i64(f64::INFINITY) && !fits_i64(2.5));
    }

    #[test]
    fn reals_in_untyped_columns_keep_their_fraction() {
        let dir = tempfile::tempdir().unwrap();
        // no declared type: values keep their REAL storage class and export as Utf8
        let db = db_with(dir.path(), "CREATE TABLE quantities (label); INSERT INTO quantities VALUES (1.0), (2.5), (0.001);");
        let out = dir.path().join("quantities.parquet");
        db.export_table_to_parquet(&TableName::new("quantities").unwrap(), &out, Compression::Snappy).unwrap();

        let batch = read_back(&out);
        let labels = batch.column(0).as_any().downcast_ref::<StringArray>().unwrap();
        let got: Vec<&str> = (0..labels.len()).map(|i| labels.value(i)).collect();
        assert_eq!(got, ["1.0", "2.5", "0.001"]);
        assert_eq!(real_text(-1.0), "-1.0");
    }

    #[test]
    fn missing_table_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let db = db_with(dir.path(), "CREATE TABLE types (id INTEGER);");
        let out = dir.path().join("units.parquet");
        let err = db.export_table_to_parquet(&TableName::new("units").unwrap(), &out, Compression::Snappy).unwrap_err();
        assert!(matches!(err.downcast_ref::<CatalogError>(), Some(CatalogError::MissingTable(t)) if t == "units"));
        assert!(!out.exists());
    }
}
