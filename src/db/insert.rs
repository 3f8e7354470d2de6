use anyhow::{anyhow, Context, Result};
use sqlx::postgres::PgArguments;
use sqlx::{PgPool, Postgres};

use crate::config::MAX_BIND_PARAMS;
use crate::db::schema::{parse_timestamp, Schema, SqlType};
use crate::formats::Record;

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// Conversion strategy for binding a column's values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeCategory {
    /// Parsed to native Rust numerics (bool, i16, i32, i64, f32, f64)
    NativeNumeric,
    /// Parsed to chrono::NaiveDateTime
    NativeParsed,
    /// Bound as text with an explicit CAST in the SQL
    StringCast,
    /// Bound as text directly
    DirectString,
}

impl TypeCategory {
    fn of(sql_type: SqlType) -> Self {
        match sql_type {
            SqlType::Boolean
            | SqlType::SmallInt
            | SqlType::Integer
            | SqlType::BigInt
            | SqlType::Real
            | SqlType::DoublePrecision => TypeCategory::NativeNumeric,
            SqlType::Timestamp => TypeCategory::NativeParsed,
            // NUMERIC stays textual end to end so precision is not squeezed
            // through a float
            SqlType::Numeric | SqlType::Date | SqlType::TimestampTz | SqlType::Bytea => {
                TypeCategory::StringCast
            }
            SqlType::Text => TypeCategory::DirectString,
        }
    }
}

/// Rows one INSERT statement can carry without exceeding the bind limit
fn rows_per_statement(columns: usize) -> usize {
    (MAX_BIND_PARAMS / columns.max(1)).max(1)
}

/// Multi-row INSERT statement text for `rows` rows
fn build_insert_sql(table: &str, schema: &Schema, rows: usize) -> String {
    let column_list: Vec<String> = schema
        .columns
        .iter()
        .map(|c| format!("\"{}\"", c.name))
        .collect();

    let mut value_groups = Vec::with_capacity(rows);
    let mut param_idx = 1usize;
    for _ in 0..rows {
        let placeholders: Vec<String> = schema
            .columns
            .iter()
            .map(|col| {
                let placeholder = format!("${}", param_idx);
                param_idx += 1;
                if TypeCategory::of(col.sql_type) == TypeCategory::StringCast {
                    format!("CAST({} AS {})", placeholder, col.sql_type.to_postgres())
                } else {
                    placeholder
                }
            })
            .collect();
        value_groups.push(format!("({})", placeholders.join(", ")));
    }

    format!(
        "INSERT INTO \"{}\" ({}) VALUES {}",
        table,
        column_list.join(", "),
        value_groups.join(", ")
    )
}

/// Append one batch of records to the destination table.
///
/// Runs as one or more INSERT statements sized to stay under the Postgres
/// bind-parameter limit. No transaction spans the statements: a failure
/// aborts the run and leaves the rows inserted so far in place.
pub async fn append_batch(
    pool: &PgPool,
    table: &str,
    schema: &Schema,
    records: &[Record],
) -> Result<()> {
    if records.is_empty() {
        return Ok(());
    }

    for chunk in records.chunks(rows_per_statement(schema.columns.len())) {
        let insert_sql = build_insert_sql(table, schema, chunk.len());

        let mut query = sqlx::query(&insert_sql);
        for record in chunk {
            anyhow::ensure!(
                record.fields.len() == schema.columns.len(),
                "row has {} fields but table \"{}\" has {} columns",
                record.fields.len(),
                table,
                schema.columns.len()
            );
            for (field, column) in record.fields.iter().zip(&schema.columns) {
                query = bind_value(query, field, column.sql_type)?;
            }
        }

        query
            .execute(pool)
            .await
            .with_context(|| format!("failed to append batch to \"{}\"", table))?;
    }

    Ok(())
}

/// Bind a single value with the conversion its column type requires
fn bind_value<'q>(query: PgQuery<'q>, value: &'q str, sql_type: SqlType) -> Result<PgQuery<'q>> {
    let trimmed = value.trim();

    // Empty fields are NULLs
    if trimmed.is_empty() {
        return Ok(bind_null(query, sql_type));
    }

    Ok(match sql_type {
        SqlType::Boolean => query.bind(parse_bool(trimmed)),
        SqlType::SmallInt => query.bind(parse_number::<i16>(trimmed, sql_type)?),
        SqlType::Integer => query.bind(parse_number::<i32>(trimmed, sql_type)?),
        SqlType::BigInt => query.bind(parse_number::<i64>(trimmed, sql_type)?),
        SqlType::Real => query.bind(parse_number::<f32>(trimmed, sql_type)?),
        SqlType::DoublePrecision => query.bind(parse_number::<f64>(trimmed, sql_type)?),
        SqlType::Timestamp => {
            let timestamp = parse_timestamp(trimmed)
                .ok_or_else(|| anyhow!("cannot convert '{}' to TIMESTAMP", trimmed))?;
            query.bind(timestamp)
        }
        // NUMERIC, DATE, TIMESTAMP WITH TIME ZONE, BYTEA are cast in SQL;
        // TEXT binds directly
        _ => query.bind(value),
    })
}

/// Bind NULL with the type the placeholder expects
fn bind_null(query: PgQuery<'_>, sql_type: SqlType) -> PgQuery<'_> {
    match sql_type {
        SqlType::Boolean => query.bind(None::<bool>),
        SqlType::SmallInt => query.bind(None::<i16>),
        SqlType::Integer => query.bind(None::<i32>),
        SqlType::BigInt => query.bind(None::<i64>),
        SqlType::Real => query.bind(None::<f32>),
        SqlType::DoublePrecision => query.bind(None::<f64>),
        SqlType::Timestamp => query.bind(None::<chrono::NaiveDateTime>),
        _ => query.bind(None::<String>),
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, sql_type: SqlType) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e| {
        anyhow!(
            "cannot convert '{}' to {}: {}",
            value,
            sql_type.to_postgres(),
            e
        )
    })
}

fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("t") || value == "1"
}
