//! Ordered reassembly of chunk artifacts into the destination file.

use crate::error::DownloadError;
use crate::plan::part_path;
use crate::store::BlobStore;
use std::path::Path;
use tracing::debug;

/// Concatenates `destination.part0 .. destination.part{chunk_count-1}` into `destination`.
///
/// Chunks are processed strictly in index order: read, write into the
/// destination, delete. Chunk 0 truncates the destination so a stale file
/// never survives. The first failure aborts the merge and leaves the
/// destination and remaining parts as they are.
///
/// # Arguments
///
/// * `store` - Blob store holding the artifacts
/// * `destination` - Output file path
/// * `chunk_count` - Number of chunk artifacts to merge
/// * `merge_pb` - Optional progress bar, incremented per merged chunk
///
/// # Returns
///
/// `Ok(())` on success, or the first storage error.
pub async fn reassemble(
    store: &dyn BlobStore,
    destination: &Path,
    chunk_count: usize,
    merge_pb: Option<&indicatif::ProgressBar>,
) -> Result<(), DownloadError> {
    for index in 0..chunk_count {
        let part = part_path(destination, index);
        let data = store.read(&part).await?;

        if index == 0 {
            store.save(destination, &data).await?;
        } else {
            store.append(destination, &data).await?;
        }

        store.delete(&part).await?;
        debug!("Merged chunk {} ({} bytes)", index, data.len());

        if let Some(pb) = merge_pb {
            pb.inc(1);
        }
    }

    Ok(())
}
