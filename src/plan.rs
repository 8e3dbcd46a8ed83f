//! Chunk planning: splits a file size into inclusive byte ranges.

use crate::error::DownloadError;
use crate::types::DownloadConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A single chunk: inclusive byte range `[start, end]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpec {
    /// Position of the chunk in the file, starting at 0.
    pub index: usize,
    /// First byte (inclusive).
    pub start: u64,
    /// Last byte (inclusive).
    pub end: u64,
}

impl ChunkSpec {
    /// Length of this chunk in bytes; never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// HTTP Range header value: `bytes=start-end`.
    pub fn range_header(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// Ordered chunk ranges for one file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    /// Total file size in bytes.
    pub size: u64,
    /// Chunk size used for every chunk but possibly the last.
    pub chunk_size: u64,
    /// Chunks ordered by index.
    pub chunks: Vec<ChunkSpec>,
}

impl ChunkPlan {
    /// Number of chunks in the plan.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// True for a zero-byte file.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Picks the chunk size for `size` under `config`.
///
/// Targets `config.target_chunks` chunks but never goes below
/// `config.min_chunk_size`. A forced `config.chunk_size` wins outright.
pub fn chunk_size_for(size: u64, config: &DownloadConfig) -> Result<u64, DownloadError> {
    if let Some(forced) = config.chunk_size {
        if forced == 0 {
            return Err(DownloadError::InvalidConfig(
                "chunk size must be at least 1 byte".to_string(),
            ));
        }
        return Ok(forced);
    }
    if config.target_chunks == 0 {
        return Err(DownloadError::InvalidConfig(
            "target chunk count must be at least 1".to_string(),
        ));
    }
    Ok((size / config.target_chunks).max(config.min_chunk_size).max(1))
}

/// Builds the chunk plan for a file of `size` bytes.
///
/// A zero-byte file yields an empty plan.
pub fn plan_chunks(size: u64, config: &DownloadConfig) -> Result<ChunkPlan, DownloadError> {
    let chunk_size = chunk_size_for(size, config)?;
    Ok(plan_with_chunk_size(size, chunk_size))
}

fn plan_with_chunk_size(size: u64, chunk_size: u64) -> ChunkPlan {
    let count = size.div_ceil(chunk_size);
    let chunks = (0..count)
        .map(|i| {
            let start = i * chunk_size;
            // Last chunk is clamped to the final byte.
            let end = start.saturating_add(chunk_size - 1).min(size - 1);
            ChunkSpec {
                index: i as usize,
                start,
                end,
            }
        })
        .collect();

    ChunkPlan {
        size,
        chunk_size,
        chunks,
    }
}

/// Path of the temporary artifact for chunk `index` of `destination`.
pub fn part_path(destination: &Path, index: usize) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(format!(".part{}", index));
    PathBuf::from(name)
}
