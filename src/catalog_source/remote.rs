//! HTTP経由のCSV取得

use crate::error::{BidWriterError, Result};
use std::time::Duration;

/// URLからCSV本文を取得（ステータスが 2xx 以外はエラー）
pub async fn fetch_text(url: &str, timeout_seconds: u64) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds.max(1)))
        .build()
        .map_err(|e| BidWriterError::CatalogFetch(e.to_string()))?;

    tracing::debug!("GET {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| BidWriterError::CatalogFetch(format!("{}: {}", url, e)))?
        .error_for_status()
        .map_err(|e| BidWriterError::CatalogFetch(format!("{}: {}", url, e)))?;

    let text = response
        .text()
        .await
        .map_err(|e| BidWriterError::CatalogFetch(format!("{}: {}", url, e)))?;
    tracing::debug!("{} bytes received", text.len());

    Ok(text)
}
