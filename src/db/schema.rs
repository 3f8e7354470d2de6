use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};

use crate::formats::Record;

/// SQL data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Real,
    DoublePrecision,
    Numeric,
    Text,
    Date,
    Timestamp,
    TimestampTz,
    Bytea,
}

impl SqlType {
    /// Returns the Postgres type name
    pub fn to_postgres(&self) -> &'static str {
        match self {
            SqlType::Boolean => "BOOLEAN",
            SqlType::SmallInt => "SMALLINT",
            SqlType::Integer => "INTEGER",
            SqlType::BigInt => "BIGINT",
            SqlType::Real => "REAL",
            SqlType::DoublePrecision => "DOUBLE PRECISION",
            SqlType::Numeric => "NUMERIC",
            SqlType::Text => "TEXT",
            SqlType::Date => "DATE",
            SqlType::Timestamp => "TIMESTAMP",
            SqlType::TimestampTz => "TIMESTAMP WITH TIME ZONE",
            SqlType::Bytea => "BYTEA",
        }
    }

    /// Find the most specific common type that accommodates both types
    pub fn common_type(&self, other: &SqlType) -> SqlType {
        if self == other {
            return *self;
        }

        use SqlType::*;
        let promoted = match (self, other) {
            // Boolean can promote to any integer type
            (Boolean, SmallInt) | (SmallInt, Boolean) => Some(SmallInt),
            (Boolean, Integer) | (Integer, Boolean) => Some(Integer),
            (Boolean, BigInt) | (BigInt, Boolean) => Some(BigInt),

            // Integer type promotions
            (SmallInt, Integer) | (Integer, SmallInt) => Some(Integer),
            (SmallInt, BigInt) | (BigInt, SmallInt) => Some(BigInt),
            (Integer, BigInt) | (BigInt, Integer) => Some(BigInt),

            // Integer to Numeric promotions
            (SmallInt | Integer | BigInt, Numeric) | (Numeric, SmallInt | Integer | BigInt) => {
                Some(Numeric)
            }

            // Float type promotions
            (Real, DoublePrecision) | (DoublePrecision, Real) => Some(DoublePrecision),

            // Numeric to float promotions
            (Numeric, Real | DoublePrecision) | (Real | DoublePrecision, Numeric) => {
                Some(DoublePrecision)
            }

            // Integer to float promotions
            (SmallInt | Integer | BigInt, Real) | (Real, SmallInt | Integer | BigInt) => Some(Real),
            (SmallInt | Integer | BigInt, DoublePrecision)
            | (DoublePrecision, SmallInt | Integer | BigInt) => Some(DoublePrecision),

            // Date/Timestamp promotions
            (Date, Timestamp) | (Timestamp, Date) => Some(Timestamp),
            (Date, TimestampTz) | (TimestampTz, Date) => Some(TimestampTz),
            (Timestamp, TimestampTz) | (TimestampTz, Timestamp) => Some(TimestampTz),

            _ => None,
        };

        promoted.unwrap_or(SqlType::Text)
    }
}

/// A column in a schema
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub sql_type: SqlType,
}

/// A database schema (collection of columns)
#[derive(Debug, Clone)]
pub struct Schema {
    pub columns: Vec<Column>,
}

/// Timestamp layouts accepted by both schema inference and value binding.
/// `%.f` accepts an optional fractional part, so full source precision
/// survives the round trip through strings.
pub const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a timestamp in any of the accepted layouts
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

/// Date layouts: ISO, US and European
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y", "%d/%m/%Y"];

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Infer the type of a single value. Empty values carry no type evidence.
fn infer_value_type(value: &str) -> Option<SqlType> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return None;
    }

    // Boolean literals only; bare 0/1 are integers, not booleans
    if trimmed.eq_ignore_ascii_case("true")
        || trimmed.eq_ignore_ascii_case("false")
        || trimmed.eq_ignore_ascii_case("t")
        || trimmed.eq_ignore_ascii_case("f")
    {
        return Some(SqlType::Boolean);
    }

    if let Ok(val) = trimmed.parse::<i64>() {
        return Some(if val >= i16::MIN as i64 && val <= i16::MAX as i64 {
            SqlType::SmallInt
        } else if val >= i32::MIN as i64 && val <= i32::MAX as i64 {
            SqlType::Integer
        } else {
            SqlType::BigInt
        });
    }

    if trimmed.parse::<f64>().is_ok() {
        // Scientific notation or many decimal places need double precision
        if trimmed.contains('e') || trimmed.contains('E') {
            return Some(SqlType::DoublePrecision);
        }
        if let Some(decimal_pos) = trimmed.find('.') {
            let decimals = trimmed.len() - decimal_pos - 1;
            if decimals > 7 {
                return Some(SqlType::DoublePrecision);
            }
        }
        return Some(SqlType::Real);
    }

    if parse_date(trimmed).is_some() {
        return Some(SqlType::Date);
    }

    if parse_timestamp(trimmed).is_some() {
        return Some(SqlType::Timestamp);
    }

    Some(SqlType::Text)
}

/// Infer a column type from the sampled values, promoting to the most
/// specific common type. A column with no non-empty values defaults to TEXT.
fn infer_column_type(values: &[&str]) -> SqlType {
    let mut inferred: Option<SqlType> = None;

    for value in values {
        if let Some(val_type) = infer_value_type(value) {
            inferred = Some(match inferred {
                None => val_type,
                Some(current) => current.common_type(&val_type),
            });
        }
    }

    inferred.unwrap_or(SqlType::Text)
}

/// Infer a schema from the header row and a sample of data rows.
///
/// Columns are created nullable: a handful of sampled rows is not evidence
/// of non-nullability.
pub fn infer_schema(headers: &[String], sample: &[Record]) -> Result<Schema> {
    if headers.is_empty() {
        anyhow::bail!("cannot infer schema without a header row");
    }

    let mut columns = Vec::with_capacity(headers.len());

    for (col_idx, name) in headers.iter().enumerate() {
        let column_values: Vec<&str> = sample
            .iter()
            .filter_map(|row| row.fields.get(col_idx).map(|s| s.as_str()))
            .collect();

        columns.push(Column {
            name: name.clone(),
            sql_type: infer_column_type(&column_values),
        });
    }

    Ok(Schema { columns })
}

/// DDL statement creating the destination table
pub fn create_table_ddl(table: &str, schema: &Schema) -> String {
    let column_defs: Vec<String> = schema
        .columns
        .iter()
        .map(|col| format!("  \"{}\" {}", col.name, col.sql_type.to_postgres()))
        .collect();

    format!("CREATE TABLE \"{}\" (\n{}\n)", table, column_defs.join(",\n"))
}

/// DDL statement dropping the destination table if it exists
pub fn drop_table_ddl(table: &str) -> String {
    format!("DROP TABLE IF EXISTS \"{}\"", table)
}
