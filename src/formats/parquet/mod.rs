//! Parquet reading - declared schema mapping and batch conversion

pub mod conversion;
pub mod reader;

pub use reader::{table_schema, ParquetSource};
