use anyhow::{Context, Result};
use futures::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Derive the local file name from a URL: the substring after the final `/`,
/// with surrounding whitespace trimmed.
pub fn file_name_from_url(url: &str) -> String {
    let trimmed = url.trim();
    trimmed
        .rsplit('/')
        .next()
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// Download the URL's contents to `dest`, returning the number of bytes written.
///
/// The HTTP status is not checked: an error body is written to disk and fails
/// later at the parse step. Transport failures (unresolvable host, refused
/// connection, interrupted body) do propagate.
pub async fn fetch_to_file(url: &str, dest: &Path) -> Result<u64> {
    let response = reqwest::get(url.trim())
        .await
        .with_context(|| format!("request to {} failed", url.trim()))?;

    let mut file = tokio::fs::File::create(dest)
        .await
        .with_context(|| format!("failed to create {}", dest.display()))?;

    let mut stream = response.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("failed reading response body")?;
        file.write_all(&chunk)
            .await
            .with_context(|| format!("failed writing to {}", dest.display()))?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_from_nested_url() {
        assert_eq!(
            file_name_from_url("https://example.com/trip-data/yellow_tripdata_2021-01.csv.gz"),
            "yellow_tripdata_2021-01.csv.gz"
        );
    }

    #[test]
    fn test_file_name_trims_whitespace() {
        assert_eq!(
            file_name_from_url("  https://example.com/data.parquet \n"),
            "data.parquet"
        );
    }

    #[test]
    fn test_file_name_without_slash() {
        assert_eq!(file_name_from_url("data.csv"), "data.csv");
    }

    #[test]
    fn test_file_name_trailing_slash_is_empty() {
        assert_eq!(file_name_from_url("https://example.com/dir/"), "");
    }
}
