use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::db::schema::{Schema, SqlType};
use crate::formats::{BatchSource, Record};

/// Trip timestamp columns that arrive as plain text in CSV exports. They are
/// typed TIMESTAMP regardless of what the sample showed; the columnar format
/// carries native timestamps and never needs this.
const KNOWN_TIMESTAMP_COLUMNS: &[&str] = &["tpep_pickup_datetime", "tpep_dropoff_datetime"];

/// Force the known trip timestamp columns to TIMESTAMP in a CSV-derived schema
pub fn promote_known_timestamp_columns(schema: &mut Schema) {
    for column in &mut schema.columns {
        if KNOWN_TIMESTAMP_COLUMNS.contains(&column.name.as_str()) {
            column.sql_type = SqlType::Timestamp;
        }
    }
}

fn open_reader(path: &Path, gzip: bool) -> Result<csv::Reader<Box<dyn Read + Send>>> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;

    let raw: Box<dyn Read + Send> = if gzip {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    Ok(csv::ReaderBuilder::new().has_headers(true).from_reader(raw))
}

/// Read the header row and up to `rows` data rows from the head of the file
pub fn read_header_and_sample(
    path: &Path,
    gzip: bool,
    rows: usize,
) -> Result<(Vec<String>, Vec<Record>)> {
    let mut reader = open_reader(path, gzip)?;

    let headers = reader
        .headers()
        .context("failed to read CSV header")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut sample = Vec::with_capacity(rows);
    for result in reader.records().take(rows) {
        let record = result.context("failed to parse CSV record")?;
        sample.push(Record {
            fields: record.iter().map(str::to_string).collect(),
        });
    }

    Ok((headers, sample))
}

/// Forward-only batch iterator over a CSV or gzipped CSV file.
///
/// Opens its own reader at the top of the file, so the first batch re-covers
/// the rows that were sampled for schema inference.
pub struct DelimitedSource {
    records: csv::StringRecordsIntoIter<Box<dyn Read + Send>>,
    batch_rows: usize,
}

impl DelimitedSource {
    pub fn open(path: &Path, gzip: bool, batch_rows: usize) -> Result<Self> {
        Ok(Self {
            records: open_reader(path, gzip)?.into_records(),
            batch_rows,
        })
    }
}

impl BatchSource for DelimitedSource {
    fn next_batch(&mut self) -> Result<Option<Vec<Record>>> {
        let mut batch = Vec::new();

        while batch.len() < self.batch_rows {
            match self.records.next() {
                Some(result) => {
                    let record = result.context("failed to parse CSV record")?;
                    batch.push(Record {
                        fields: record.iter().map(str::to_string).collect(),
                    });
                }
                None => break,
            }
        }

        if batch.is_empty() {
            Ok(None)
        } else {
            Ok(Some(batch))
        }
    }
}
