//! Configuration constants for the data loader
//!
//! This module centralizes all tunable parameters and constants used throughout
//! the application.

use std::time::Duration;

/// Rows per batch when streaming the source file into the table
pub const BATCH_ROWS: usize = 100_000;

/// Rows sampled from the head of the file for schema inference
pub const SCHEMA_SAMPLE_ROWS: usize = 10;

/// Postgres wire-protocol limit on bind parameters per statement
///
/// A 100,000-row batch carries far more values than one statement can bind,
/// so a batch append runs as several INSERT statements sized to stay under
/// this limit.
pub const MAX_BIND_PARAMS: usize = 65_535;

/// Timeout for acquiring the database connection
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(45);
