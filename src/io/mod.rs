//! I/O layer - fetching the source file onto local disk

pub mod download;

pub use download::{fetch_to_file, file_name_from_url};
