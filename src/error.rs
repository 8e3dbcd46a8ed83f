//! Error types for chunked download operations.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading or writing blobs.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The blob does not exist.
    #[error("blob not found: {}", path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// Any other I/O failure on a blob.
    #[error("storage failure on {}: {source}", path.display())]
    Io {
        /// Path the operation targeted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    /// Maps an I/O error for `path`, turning `ErrorKind::NotFound` into [`StorageError::NotFound`].
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            StorageError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            StorageError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// Returns true when the blob was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

/// Errors that can occur during a chunked download.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request error during a probe or chunk fetch.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// Transport-level failure that carries no `reqwest::Error`.
    #[error("transport failure: {0}")]
    TransportMessage(String),

    /// The server response cannot be used to plan or verify chunks.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Saving, reading or deleting a blob failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A chunk task panicked or was aborted.
    #[error("chunk task failed: {0}")]
    TaskFailed(String),

    /// A chunk task stopped because a sibling failed first.
    #[error("chunk download cancelled")]
    Cancelled,

    /// The download configuration cannot produce a chunk plan.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DownloadError {
    /// Returns true for network failures, whether or not they carry a `reqwest::Error`.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            DownloadError::Transport(_) | DownloadError::TransportMessage(_)
        )
    }

    /// Returns true if the failure is a missing blob.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DownloadError::Storage(e) if e.is_not_found())
    }
}
