//! Range probing and chunk fetching over HTTP.

use crate::error::DownloadError;
use crate::types::DownloadConfig;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::header::{CONTENT_RANGE, RANGE};
use tracing::debug;

/// Source of file sizes and byte ranges.
///
/// Implementations hold no per-download state; one instance is shared by all
/// chunk tasks of a download.
#[async_trait]
pub trait RangeFetcher: Send + Sync {
    /// Returns the total size of the remote file.
    async fn probe_size(&self, url: &str) -> Result<u64, DownloadError>;

    /// Returns the bytes `[start, end]` (inclusive) of the remote file.
    async fn fetch_range(&self, url: &str, start: u64, end: u64) -> Result<Bytes, DownloadError>;
}

/// Extracts the total from a `Content-Range` value such as `bytes 0-0/1234`.
///
/// Unsatisfied-range forms like `bytes */1234` are accepted as well. An unknown
/// total (`*`) cannot be used for planning and is rejected.
pub fn parse_content_range_total(value: &str) -> Result<u64, DownloadError> {
    let (_, total) = value.trim().rsplit_once('/').ok_or_else(|| {
        DownloadError::Protocol(format!(
            "Content-Range header is not in a valid format: {:?}",
            value
        ))
    })?;
    total.trim().parse::<u64>().map_err(|_| {
        DownloadError::Protocol(format!(
            "Content-Range header has no usable total size: {:?}",
            value
        ))
    })
}

/// [`RangeFetcher`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpRangeFetcher {
    client: reqwest::Client,
}

impl HttpRangeFetcher {
    /// Builds a fetcher using the connect timeout and user agent from `config`.
    pub fn new(config: &DownloadConfig) -> Result<Self, DownloadError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Wraps an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RangeFetcher for HttpRangeFetcher {
    async fn probe_size(&self, url: &str) -> Result<u64, DownloadError> {
        let response = self.client.get(url).header(RANGE, "bytes=0-0").send().await?;

        let content_range = response
            .headers()
            .get(CONTENT_RANGE)
            .ok_or_else(|| {
                DownloadError::Protocol(format!(
                    "no Content-Range header in range probe response from {} (HTTP {})",
                    url,
                    response.status()
                ))
            })?
            .to_str()
            .map_err(|_| {
                DownloadError::Protocol("Content-Range header is not valid ASCII".to_string())
            })?;

        let size = parse_content_range_total(content_range)?;
        debug!("Probed {}: {} bytes", url, size);
        Ok(size)
    }

    async fn fetch_range(&self, url: &str, start: u64, end: u64) -> Result<Bytes, DownloadError> {
        let span = end.checked_sub(start).ok_or_else(|| {
            DownloadError::Protocol(format!("inverted byte range {}-{}", start, end))
        })?;

        let response = self
            .client
            .get(url)
            .header(RANGE, format!("bytes={}-{}", start, end))
            .send()
            .await?
            .error_for_status()?;

        let capacity = usize::try_from(span.saturating_add(1)).unwrap_or(0);
        let mut body = BytesMut::with_capacity(capacity);
        let mut byte_stream = response.bytes_stream();
        while let Some(piece) = byte_stream.next().await {
            body.extend_from_slice(&piece?);
        }

        Ok(body.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_content_range() {
        assert_eq!(parse_content_range_total("bytes 0-0/1234").unwrap(), 1234);
        assert_eq!(parse_content_range_total(" bytes 0-0/25 ").unwrap(), 25);
    }

    #[test]
    fn parses_unsatisfied_range_total() {
        assert_eq!(parse_content_range_total("bytes */0").unwrap(), 0);
    }

    #[tokio::test]
    async fn inverted_range_is_rejected_before_sending() {
        let fetcher = HttpRangeFetcher::new(&DownloadConfig::default()).unwrap();

        // Nothing listens on port 1; a request would be a transport error.
        let err = fetcher
            .fetch_range("http://127.0.0.1:1/file", 10, 9)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Protocol(_)), "got {}", err);
    }

    #[test]
    fn rejects_malformed_content_range() {
        for value in ["", "bytes 0-0", "bytes 0-0/*", "bytes 0-0/-5", "bytes 0-0/abc"] {
            assert!(
                matches!(
                    parse_content_range_total(value),
                    Err(DownloadError::Protocol(_))
                ),
                "{:?} should be rejected",
                value
            );
        }
    }
}
