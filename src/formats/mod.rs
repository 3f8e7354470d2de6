//! File format detection and batch reading

pub mod delimited;
pub mod parquet;

use anyhow::Result;

/// Supported source file formats, detected from the file name suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv { gzip: bool },
    Parquet,
}

impl Format {
    /// Detect the format from a file name (case-insensitive suffix check).
    /// Returns None for anything other than .csv, .csv.gz or .parquet.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();

        if lower.ends_with(".csv.gz") {
            Some(Format::Csv { gzip: true })
        } else if lower.ends_with(".csv") {
            Some(Format::Csv { gzip: false })
        } else if lower.ends_with(".parquet") {
            Some(Format::Parquet)
        } else {
            None
        }
    }
}

/// A single record (row) from the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub fields: Vec<String>,
}

/// A forward-only, non-restartable source of row batches in file order.
///
/// Batches contain up to the configured row count; the final batch may be
/// shorter. The sequence is driven to exhaustion exactly once.
pub trait BatchSource {
    /// The next batch, or None once the file is exhausted
    fn next_batch(&mut self) -> Result<Option<Vec<Record>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        let cases = [
            ("rides.csv", Some(Format::Csv { gzip: false })),
            ("rides.CSV", Some(Format::Csv { gzip: false })),
            ("rides.csv.gz", Some(Format::Csv { gzip: true })),
            ("rides.Csv.Gz", Some(Format::Csv { gzip: true })),
            ("rides.parquet", Some(Format::Parquet)),
            ("rides.PARQUET", Some(Format::Parquet)),
            ("rides.txt", None),
            ("rides.json", None),
            ("rides", None),
            ("", None),
        ];

        for (name, expected) in cases {
            assert_eq!(Format::from_file_name(name), expected, "file '{}'", name);
        }
    }

    #[test]
    fn test_gz_requires_csv_prefix() {
        assert_eq!(Format::from_file_name("rides.gz"), None);
        assert_eq!(Format::from_file_name("rides.parquet.gz"), None);
    }
}
