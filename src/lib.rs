//! rangefetch - download one file over HTTP as concurrent byte-range chunks
//!
//! The remote size is learned from a `bytes=0-0` range probe, the file is split
//! into chunks, every chunk is fetched in its own task and stored as
//! `<destination>.partN`, and the parts are merged into the destination in
//! order once all of them have arrived.
//!
//! # Features
//!
//! - **Full fan-out**: one task per chunk, no worker cap
//! - **First error wins**: the first failing chunk decides the returned error
//! - **Cancellation**: in-flight siblings are cancelled after a failure
//! - **Cleanup**: leftover part files are removed after a failed fetch stage
//! - **Injectable backends**: [`RangeFetcher`] and [`BlobStore`] are traits
//!
//! # Example
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let summary = rangefetch::download_file("https://example.com/big.iso", "big.iso").await?;
//! println!("{} bytes", summary.size);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fetch;
pub mod merge;
pub mod orchestrator;
pub mod plan;
pub mod store;
pub mod types;

pub use error::{DownloadError, StorageError};
pub use fetch::{parse_content_range_total, HttpRangeFetcher, RangeFetcher};
pub use orchestrator::{download_file, Downloader};
pub use plan::{part_path, plan_chunks, ChunkPlan, ChunkSpec};
pub use store::{BlobStore, LocalBlobStore, MemoryBlobStore};
pub use types::{DownloadConfig, DownloadRequest, DownloadSummary};
