//! Database layer - connection handling, schema inference and batch writes

pub mod insert;
pub mod pool;
pub mod schema;

use anyhow::{Context, Result};
use sqlx::PgPool;

pub use insert::append_batch;
pub use pool::{connect, ConnectArgs, ConnectArgsBuilder};

/// Create the destination table from the inferred schema, replacing any
/// existing table of the same name. Writes zero rows.
pub async fn create_table(pool: &PgPool, table: &str, schema: &schema::Schema) -> Result<()> {
    sqlx::query(&schema::drop_table_ddl(table))
        .execute(pool)
        .await
        .with_context(|| format!("failed to drop existing table \"{}\"", table))?;

    sqlx::query(&schema::create_table_ddl(table, schema))
        .execute(pool)
        .await
        .with_context(|| format!("failed to create table \"{}\"", table))?;

    Ok(())
}
