//! Parquet file reader implementation.

use anyhow::{Context, Result};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use std::fs::File;
use std::path::Path;

use super::conversion::record_batch_to_records;
use crate::db::schema::{Column, Schema, SqlType};
use crate::formats::{BatchSource, Record};

/// Map the file's declared Arrow schema to SQL column types.
///
/// Parquet carries typed columns, so the destination schema comes straight
/// from the file metadata; temporal types are preserved as-is and never go
/// through text inference.
pub fn table_schema(path: &Path) -> Result<Schema> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("failed to read Parquet metadata")?;

    let mut columns = Vec::with_capacity(builder.schema().fields().len());
    for field in builder.schema().fields() {
        columns.push(Column {
            name: field.name().clone(),
            sql_type: sql_type_for(field.data_type())
                .with_context(|| format!("unsupported Parquet column \"{}\"", field.name()))?,
        });
    }

    Ok(Schema { columns })
}

fn sql_type_for(data_type: &DataType) -> Result<SqlType> {
    Ok(match data_type {
        DataType::Boolean => SqlType::Boolean,
        DataType::Int8 | DataType::Int16 | DataType::UInt8 => SqlType::SmallInt,
        DataType::Int32 | DataType::UInt16 => SqlType::Integer,
        DataType::Int64 | DataType::UInt32 => SqlType::BigInt,
        // u64 can exceed BIGINT's range
        DataType::UInt64 => SqlType::Numeric,
        DataType::Float32 => SqlType::Real,
        DataType::Float64 => SqlType::DoublePrecision,
        DataType::Utf8 | DataType::LargeUtf8 => SqlType::Text,
        DataType::Binary | DataType::LargeBinary => SqlType::Bytea,
        DataType::Date32 | DataType::Date64 => SqlType::Date,
        DataType::Timestamp(_, None) => SqlType::Timestamp,
        DataType::Timestamp(_, Some(_)) => SqlType::TimestampTz,
        DataType::Decimal128(_, _) | DataType::Decimal256(_, _) => SqlType::Numeric,
        other => anyhow::bail!("no SQL mapping for Arrow type {:?}", other),
    })
}

/// Forward-only batch iterator over a Parquet file, yielding row-form Records
/// in file order.
pub struct ParquetSource {
    reader: ParquetRecordBatchReader,
}

impl ParquetSource {
    pub fn open(path: &Path, batch_rows: usize) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .context("failed to read Parquet metadata")?
            .with_batch_size(batch_rows)
            .build()
            .context("failed to build Parquet reader")?;

        Ok(Self { reader })
    }
}

impl BatchSource for ParquetSource {
    fn next_batch(&mut self) -> Result<Option<Vec<Record>>> {
        match self.reader.next() {
            Some(batch) => {
                let batch = batch.context("failed to read record batch")?;
                Ok(Some(record_batch_to_records(&batch)?))
            }
            None => Ok(None),
        }
    }
}
