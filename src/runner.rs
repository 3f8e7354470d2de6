//! High-level runner API for the loader.
//!
//! This is the primary entry point for the CLI: it wires the download, format
//! detection, schema inference and batch streaming together for one run.

use anyhow::{anyhow, Result};
use sqlx::PgPool;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;

use crate::config::{BATCH_ROWS, SCHEMA_SAMPLE_ROWS};
use crate::db::{self, schema};
use crate::formats::{delimited, parquet, BatchSource, Format};
use crate::io;

pub use crate::db::{ConnectArgs, ConnectArgsBuilder};

/// Arguments for one load run
pub struct LoadArgs {
    pub connect: ConnectArgs,
    pub table: String,
    pub url: String,
}

/// Result of a completed load run
#[derive(Debug)]
pub struct LoadSummary {
    pub batches: u64,
    pub rows: u64,
    pub duration: Duration,
}

/// Run a complete load: download the file, detect its format, create the
/// destination table from a sample, and stream the file into it in batches.
///
/// An unsupported file suffix fails before any database handle exists. The
/// downloaded file is left on disk.
pub async fn run_load(args: LoadArgs) -> Result<LoadSummary> {
    let file_name = io::file_name_from_url(&args.url);
    info!("downloading {} ...", file_name);
    let bytes = io::fetch_to_file(&args.url, Path::new(&file_name)).await?;
    info!("downloaded {} bytes to {}", bytes, file_name);

    let format = Format::from_file_name(&file_name).ok_or_else(|| {
        anyhow!(
            "unsupported file '{}': only .csv, .csv.gz and .parquet files can be loaded",
            file_name
        )
    })?;

    let pool = db::connect(&args.connect)?;
    let result = stream_into_table(&pool, &args, &file_name, format).await;
    // Release the connection on success and failure alike
    pool.close().await;
    result
}

async fn stream_into_table(
    pool: &PgPool,
    args: &LoadArgs,
    file_name: &str,
    format: Format,
) -> Result<LoadSummary> {
    let path = Path::new(file_name);

    let (schema, mut source): (schema::Schema, Box<dyn BatchSource>) = match format {
        Format::Csv { gzip } => {
            let (headers, sample) =
                delimited::read_header_and_sample(path, gzip, SCHEMA_SAMPLE_ROWS)?;
            let mut schema = schema::infer_schema(&headers, &sample)?;
            delimited::promote_known_timestamp_columns(&mut schema);
            let source = delimited::DelimitedSource::open(path, gzip, BATCH_ROWS)?;
            (schema, Box::new(source))
        }
        Format::Parquet => {
            let schema = parquet::table_schema(path)?;
            let source = parquet::ParquetSource::open(path, BATCH_ROWS)?;
            (schema, Box::new(source))
        }
    };

    db::create_table(pool, &args.table, &schema).await?;
    info!(
        "created table \"{}\" with {} columns",
        args.table,
        schema.columns.len()
    );

    let started = Instant::now();
    let mut batches = 0u64;
    let mut rows = 0u64;

    while let Some(batch) = source.next_batch()? {
        batches += 1;
        info!("inserting batch {} ...", batches);

        let batch_start = Instant::now();
        db::append_batch(pool, &args.table, &schema, &batch).await?;
        rows += batch.len() as u64;

        info!(
            "inserted batch {} ({} rows) in {:.3}s",
            batches,
            batch.len(),
            batch_start.elapsed().as_secs_f64()
        );
    }

    let duration = started.elapsed();
    info!(
        "completed: {} rows in {} batches, {:.3}s total",
        rows,
        batches,
        duration.as_secs_f64()
    );

    Ok(LoadSummary {
        batches,
        rows,
        duration,
    })
}
