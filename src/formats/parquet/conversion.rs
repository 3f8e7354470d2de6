//! Conversion from Arrow RecordBatch to row-based Records.
//!
//! This module converts Arrow's columnar format to the string-based Record
//! format used throughout the loader. All values are converted to strings,
//! with nulls represented as empty strings; the insert layer parses them back
//! to typed values based on the destination schema. Timestamps keep their
//! fractional seconds so source precision survives the round trip.

use anyhow::{Context, Result};
use arrow::array::*;
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Decimal128Type, Decimal256Type, Float32Type, Float64Type,
    Int8Type, Int16Type, Int32Type, Int64Type, TimeUnit, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType, UInt8Type, UInt16Type,
    UInt32Type, UInt64Type,
};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};

use crate::formats::Record;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Convert an Arrow RecordBatch to a vector of Records
pub fn record_batch_to_records(batch: &RecordBatch) -> Result<Vec<Record>> {
    let num_rows = batch.num_rows();
    let num_columns = batch.num_columns();

    if num_rows == 0 {
        return Ok(Vec::new());
    }

    let mut column_strings: Vec<Vec<String>> = Vec::with_capacity(num_columns);
    for col_idx in 0..num_columns {
        let array = batch.column(col_idx);
        let strings = array_to_strings(array).with_context(|| {
            format!(
                "failed to convert column {} ({:?}) to strings",
                col_idx,
                array.data_type()
            )
        })?;
        column_strings.push(strings);
    }

    // Transpose to rows
    let mut records = Vec::with_capacity(num_rows);
    for row_idx in 0..num_rows {
        let fields = column_strings
            .iter()
            .map(|col| col[row_idx].clone())
            .collect();

        records.push(Record { fields });
    }

    Ok(records)
}

/// Convert an Arrow array to a vector of string representations
fn array_to_strings(array: &dyn Array) -> Result<Vec<String>> {
    let mut strings = Vec::with_capacity(array.len());

    match array.data_type() {
        DataType::Boolean => convert_values(as_boolean_array(array), &mut strings, |v| v.to_string()),
        DataType::Int8 => convert_primitive::<Int8Type>(array, &mut strings),
        DataType::Int16 => convert_primitive::<Int16Type>(array, &mut strings),
        DataType::Int32 => convert_primitive::<Int32Type>(array, &mut strings),
        DataType::Int64 => convert_primitive::<Int64Type>(array, &mut strings),
        DataType::UInt8 => convert_primitive::<UInt8Type>(array, &mut strings),
        DataType::UInt16 => convert_primitive::<UInt16Type>(array, &mut strings),
        DataType::UInt32 => convert_primitive::<UInt32Type>(array, &mut strings),
        DataType::UInt64 => convert_primitive::<UInt64Type>(array, &mut strings),
        DataType::Float32 => convert_primitive::<Float32Type>(array, &mut strings),
        DataType::Float64 => convert_primitive::<Float64Type>(array, &mut strings),
        DataType::Utf8 => convert_values(as_string_array(array), &mut strings, |v| v.to_string()),
        DataType::LargeUtf8 => {
            convert_values(as_largestring_array(array), &mut strings, |v| v.to_string())
        }
        // Postgres bytea hex escape form
        DataType::Binary => convert_values(as_generic_binary_array::<i32>(array), &mut strings, |v| {
            format!("\\x{}", hex::encode(v))
        }),
        DataType::LargeBinary => {
            convert_values(as_generic_binary_array::<i64>(array), &mut strings, |v| {
                format!("\\x{}", hex::encode(v))
            })
        }
        DataType::Date32 => {
            // Days since the Unix epoch
            let arr = as_primitive_array::<Date32Type>(array);
            for i in 0..arr.len() {
                strings.push(if arr.is_null(i) {
                    String::new()
                } else {
                    let date = DateTime::from_timestamp(arr.value(i) as i64 * 86_400, 0)
                        .context("invalid date")?
                        .date_naive();
                    date.format("%Y-%m-%d").to_string()
                });
            }
        }
        DataType::Date64 => {
            let arr = as_primitive_array::<Date64Type>(array);
            for i in 0..arr.len() {
                strings.push(if arr.is_null(i) {
                    String::new()
                } else {
                    let date = DateTime::from_timestamp_millis(arr.value(i))
                        .context("invalid date")?
                        .date_naive();
                    date.format("%Y-%m-%d").to_string()
                });
            }
        }
        DataType::Timestamp(unit, tz) => {
            convert_timestamp(array, unit, tz.is_some(), &mut strings)?;
        }
        DataType::Decimal128(_, scale) => {
            // Negative scales do not occur in practice; render them as scale 0
            let scale = (*scale).max(0) as u32;
            convert_values(as_primitive_array::<Decimal128Type>(array), &mut strings, |v| {
                format_decimal128(v, scale)
            });
        }
        DataType::Decimal256(_, _) => {
            convert_values(as_primitive_array::<Decimal256Type>(array), &mut strings, |v| {
                v.to_string()
            });
        }
        _ => {
            return Err(anyhow::anyhow!(
                "unsupported array type for conversion: {:?}",
                array.data_type()
            ));
        }
    }

    Ok(strings)
}

/// Render every value of an array through `f`, nulls as empty strings
fn convert_values<A, F>(arr: A, strings: &mut Vec<String>, f: F)
where
    A: ArrayAccessor,
    F: Fn(A::Item) -> String,
{
    for i in 0..arr.len() {
        strings.push(if arr.is_null(i) {
            String::new()
        } else {
            f(arr.value(i))
        });
    }
}

fn convert_primitive<T: ArrowPrimitiveType>(array: &dyn Array, strings: &mut Vec<String>)
where
    T::Native: std::fmt::Display,
{
    convert_values(as_primitive_array::<T>(array), strings, |v| v.to_string());
}

/// Convert timestamp arrays to strings. Zoned arrays hold UTC epochs, so the
/// rendered value gets an explicit +00:00 offset.
fn convert_timestamp(
    array: &dyn Array,
    unit: &TimeUnit,
    zoned: bool,
    strings: &mut Vec<String>,
) -> Result<()> {
    fn render(datetime: Option<DateTime<Utc>>, zoned: bool) -> Result<String> {
        let datetime = datetime.context("invalid timestamp")?;
        let mut rendered = datetime.format(TIMESTAMP_FORMAT).to_string();
        if zoned {
            rendered.push_str("+00:00");
        }
        Ok(rendered)
    }

    match unit {
        TimeUnit::Second => {
            let arr = as_primitive_array::<TimestampSecondType>(array);
            for i in 0..arr.len() {
                strings.push(if arr.is_null(i) {
                    String::new()
                } else {
                    render(DateTime::from_timestamp(arr.value(i), 0), zoned)?
                });
            }
        }
        TimeUnit::Millisecond => {
            let arr = as_primitive_array::<TimestampMillisecondType>(array);
            for i in 0..arr.len() {
                strings.push(if arr.is_null(i) {
                    String::new()
                } else {
                    render(DateTime::from_timestamp_millis(arr.value(i)), zoned)?
                });
            }
        }
        TimeUnit::Microsecond => {
            let arr = as_primitive_array::<TimestampMicrosecondType>(array);
            for i in 0..arr.len() {
                strings.push(if arr.is_null(i) {
                    String::new()
                } else {
                    render(DateTime::from_timestamp_micros(arr.value(i)), zoned)?
                });
            }
        }
        TimeUnit::Nanosecond => {
            let arr = as_primitive_array::<TimestampNanosecondType>(array);
            for i in 0..arr.len() {
                strings.push(if arr.is_null(i) {
                    String::new()
                } else {
                    render(Some(DateTime::from_timestamp_nanos(arr.value(i))), zoned)?
                });
            }
        }
    }
    Ok(())
}

/// Format a Decimal128 value with the given scale
fn format_decimal128(value: i128, scale: u32) -> String {
    if scale == 0 {
        return value.to_string();
    }

    let divisor = 10_u128.pow(scale);
    let sign = if value < 0 { "-" } else { "" };
    let magnitude = value.unsigned_abs();
    let int_part = magnitude / divisor;
    let frac_part = magnitude % divisor;

    format!("{}{}.{:0width$}", sign, int_part, frac_part, width = scale as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{
        BooleanArray, Float64Array, Int32Array, Int64Array, StringArray, TimestampMicrosecondArray,
    };
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    #[test]
    fn test_record_batch_to_records_integers() {
        let schema = Schema::new(vec![
            Field::new("int32", DataType::Int32, false),
            Field::new("int64", DataType::Int64, false),
        ]);

        let int32_array = Int32Array::from(vec![1, 2, 3]);
        let int64_array = Int64Array::from(vec![100, 200, 300]);

        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(int32_array), Arc::new(int64_array)],
        )
        .unwrap();

        let records = record_batch_to_records(&batch).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].fields, vec!["1", "100"]);
        assert_eq!(records[2].fields, vec!["3", "300"]);
    }

    #[test]
    fn test_nulls_become_empty_strings() {
        let schema = Schema::new(vec![Field::new("name", DataType::Utf8, true)]);
        let string_array = StringArray::from(vec![Some("Alice"), None, Some("Bob")]);

        let batch = RecordBatch::try_new(Arc::new(schema), vec![Arc::new(string_array)]).unwrap();
        let records = record_batch_to_records(&batch).unwrap();

        assert_eq!(records[0].fields, vec!["Alice"]);
        assert_eq!(records[1].fields, vec![""]);
        assert_eq!(records[2].fields, vec!["Bob"]);
    }

    #[test]
    fn test_booleans_and_floats() {
        let schema = Schema::new(vec![
            Field::new("flag", DataType::Boolean, false),
            Field::new("value", DataType::Float64, true),
        ]);

        let flag_array = BooleanArray::from(vec![true, false]);
        let value_array = Float64Array::from(vec![Some(100.5), None]);

        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(flag_array), Arc::new(value_array)],
        )
        .unwrap();

        let records = record_batch_to_records(&batch).unwrap();
        assert_eq!(records[0].fields, vec!["true", "100.5"]);
        assert_eq!(records[1].fields, vec!["false", ""]);
    }

    #[test]
    fn test_dates() {
        let schema = Schema::new(vec![Field::new("date", DataType::Date32, false)]);

        // Days since epoch: 0 = 1970-01-01, 18993 = 2022-01-01
        let date_array = Date32Array::from(vec![0, 18993]);

        let batch = RecordBatch::try_new(Arc::new(schema), vec![Arc::new(date_array)]).unwrap();
        let records = record_batch_to_records(&batch).unwrap();

        assert_eq!(records[0].fields, vec!["1970-01-01"]);
        assert_eq!(records[1].fields, vec!["2022-01-01"]);
    }

    #[test]
    fn test_timestamps_keep_microsecond_precision() {
        let schema = Schema::new(vec![Field::new(
            "ts",
            DataType::Timestamp(TimeUnit::Microsecond, None),
            false,
        )]);

        // 2021-01-01 00:30:10.125000 UTC and a whole-second value
        let micros = 1_609_461_010_125_000i64;
        let whole = 1_609_461_010_000_000i64;
        let ts_array = TimestampMicrosecondArray::from(vec![micros, whole]);

        let batch = RecordBatch::try_new(Arc::new(schema), vec![Arc::new(ts_array)]).unwrap();
        let records = record_batch_to_records(&batch).unwrap();

        assert_eq!(records[0].fields, vec!["2021-01-01 00:30:10.125"]);
        // No fractional part when it is zero
        assert_eq!(records[1].fields, vec!["2021-01-01 00:30:10"]);
    }

    #[test]
    fn test_zoned_timestamps_carry_utc_offset() {
        let schema = Schema::new(vec![Field::new(
            "ts",
            DataType::Timestamp(TimeUnit::Second, Some("UTC".into())),
            false,
        )]);

        let ts_array = TimestampSecondArray::from(vec![1_609_461_010i64])
            .with_timezone("UTC");

        let batch = RecordBatch::try_new(Arc::new(schema), vec![Arc::new(ts_array)]).unwrap();
        let records = record_batch_to_records(&batch).unwrap();

        assert_eq!(records[0].fields, vec!["2021-01-01 00:30:10+00:00"]);
    }

    #[test]
    fn test_binary_renders_as_bytea_hex() {
        let schema = Schema::new(vec![Field::new("blob", DataType::Binary, true)]);
        let binary_array = BinaryArray::from_opt_vec(vec![Some(b"hi".as_ref()), None]);

        let batch = RecordBatch::try_new(Arc::new(schema), vec![Arc::new(binary_array)]).unwrap();
        let records = record_batch_to_records(&batch).unwrap();

        assert_eq!(records[0].fields, vec!["\\x6869"]);
        assert_eq!(records[1].fields, vec![""]);
    }

    #[test]
    fn test_format_decimal128() {
        assert_eq!(format_decimal128(12345, 2), "123.45");
        assert_eq!(format_decimal128(1, 2), "0.01");
        assert_eq!(format_decimal128(100, 2), "1.00");
        assert_eq!(format_decimal128(-12345, 2), "-123.45");
        assert_eq!(format_decimal128(-45, 2), "-0.45");
        assert_eq!(format_decimal128(12345, 0), "12345");
    }

    #[test]
    fn test_empty_batch() {
        let schema = Schema::new(vec![Field::new("id", DataType::Int32, false)]);
        let int32_array = Int32Array::from(vec![] as Vec<i32>);

        let batch = RecordBatch::try_new(Arc::new(schema), vec![Arc::new(int32_array)]).unwrap();
        let records = record_batch_to_records(&batch).unwrap();

        assert_eq!(records.len(), 0);
    }
}
