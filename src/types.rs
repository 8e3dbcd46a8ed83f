//! Data structures for download requests and configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Smallest chunk the planner will produce unless a chunk size is forced.
pub const DEFAULT_MIN_CHUNK_SIZE: u64 = 1024 * 1024;

/// Number of chunks the planner aims for on large files.
pub const DEFAULT_TARGET_CHUNKS: u64 = 10;

/// A single download: where to fetch from and where to put the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Remote URL of the file.
    pub url: String,
    /// Local path of the assembled file.
    pub destination: PathBuf,
}

impl DownloadRequest {
    /// Creates a new request.
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
        }
    }
}

/// Configuration for chunked downloads.
///
/// # Example
///
/// ```
/// use rangefetch::DownloadConfig;
///
/// let config = DownloadConfig {
///     chunk_size: Some(4 * 1024 * 1024),
///     cleanup_on_failure: false,
///     ..DownloadConfig::default()
/// };
/// assert_eq!(config.target_chunks, 10);
/// ```
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Lower bound for the computed chunk size (default: 1 MiB).
    pub min_chunk_size: u64,
    /// Desired number of chunks for large files (default: 10).
    pub target_chunks: u64,
    /// Forces an exact chunk size, bypassing `min_chunk_size` and `target_chunks`.
    pub chunk_size: Option<u64>,
    /// Cancel in-flight chunk requests once one chunk fails (default: true).
    pub cancel_on_failure: bool,
    /// Remove leftover `.partN` files after a failed fetch stage (default: true).
    pub cleanup_on_failure: bool,
    /// Connect timeout for the HTTP fetcher. `None` means no timeout.
    pub connect_timeout: Option<Duration>,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
            target_chunks: DEFAULT_TARGET_CHUNKS,
            chunk_size: None,
            cancel_on_failure: true,
            cleanup_on_failure: true,
            connect_timeout: None,
            user_agent: concat!("rangefetch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Outcome of a successful download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Total file size in bytes.
    pub size: u64,
    /// Number of chunks that were fetched.
    pub chunks: usize,
    /// Wall time from probe to final cleanup.
    pub elapsed: Duration,
}
