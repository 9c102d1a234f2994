//! Bounded PDF download
//!
//! The body is streamed and the running total is checked after every chunk,
//! so an oversized document is dropped mid-transfer instead of being
//! buffered first.

use std::time::Duration;

use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;

use super::types::VerifyError;

/// Progress is logged each time another 5MB has arrived
const PROGRESS_STEP: u64 = 5 * 1024 * 1024;

/// Downloads PDFs within a size cap
#[derive(Debug, Clone)]
pub struct PdfFetcher {
    client: reqwest::Client,
    max_bytes: u64,
}

impl PdfFetcher {
    /// `timeout` applies to connecting and to each read separately.
    pub fn new(timeout: Duration, max_bytes: u64) -> Result<Self, VerifyError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;
        Ok(Self { client, max_bytes })
    }

    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, VerifyError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerifyError::Status(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();
        if !content_type.contains("pdf") {
            return Err(VerifyError::NotPdf(content_type));
        }

        if let Some(declared) = response.content_length() {
            if declared > self.max_bytes {
                return Err(VerifyError::TooLarge { size: declared, max: self.max_bytes });
            }
        }

        tracing::debug!(
            url = %url,
            limit_mb = self.max_bytes / (1024 * 1024),
            "Starting PDF download"
        );

        let mut body = Vec::new();
        let mut size: u64 = 0;
        let mut next_report = PROGRESS_STEP;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            size += chunk.len() as u64;
            if size > self.max_bytes {
                return Err(VerifyError::TooLarge { size, max: self.max_bytes });
            }
            body.extend_from_slice(&chunk);

            if size >= next_report {
                tracing::debug!(
                    url = %url,
                    downloaded_mb = size / (1024 * 1024),
                    "Downloading PDF"
                );
                next_report += PROGRESS_STEP;
            }
        }

        tracing::debug!(url = %url, bytes = size, "Download complete");
        Ok(body)
    }
}
