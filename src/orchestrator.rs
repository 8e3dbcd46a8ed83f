//! Main orchestration logic for chunked downloads.

use crate::error::DownloadError;
use crate::fetch::{HttpRangeFetcher, RangeFetcher};
use crate::merge::reassemble;
use crate::plan::{part_path, plan_chunks, ChunkPlan, ChunkSpec};
use crate::store::{BlobStore, LocalBlobStore};
use crate::types::{DownloadConfig, DownloadRequest, DownloadSummary};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Downloads one file as a set of concurrently fetched byte ranges.
///
/// The fetcher and store are injected so either can be swapped out, e.g. for
/// [`MemoryBlobStore`](crate::store::MemoryBlobStore) in tests.
pub struct Downloader {
    fetcher: Arc<dyn RangeFetcher>,
    store: Arc<dyn BlobStore>,
    config: DownloadConfig,
    progress: Option<indicatif::ProgressBar>,
}

impl Downloader {
    pub fn new(
        fetcher: Arc<dyn RangeFetcher>,
        store: Arc<dyn BlobStore>,
        config: DownloadConfig,
    ) -> Self {
        Self {
            fetcher,
            store,
            config,
            progress: None,
        }
    }

    /// Builds a downloader with the reqwest fetcher and the local filesystem store.
    pub fn http(config: DownloadConfig) -> Result<Self, DownloadError> {
        let fetcher = HttpRangeFetcher::new(&config)?;
        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(LocalBlobStore::new()),
            config,
        ))
    }

    /// Attaches a progress bar that advances once per stored and once per merged chunk.
    pub fn with_progress(mut self, pb: indicatif::ProgressBar) -> Self {
        self.progress = Some(pb);
        self
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Probes the remote size and computes the chunk plan without downloading.
    pub async fn plan(&self, url: &str) -> Result<ChunkPlan, DownloadError> {
        info!("Sizing {}", url);
        let size = self.fetcher.probe_size(url).await?;

        let plan = plan_chunks(size, &self.config)?;
        info!(
            "Planned {} chunk(s) of up to {} bytes for {} bytes",
            plan.len(),
            plan.chunk_size,
            size
        );
        Ok(plan)
    }

    /// Downloads `request.url` into `request.destination`.
    ///
    /// Steps:
    ///
    /// 1. Probes the total size with a `bytes=0-0` request
    /// 2. Plans chunk ranges
    /// 3. Fetches every chunk concurrently into `<destination>.part<N>`
    /// 4. Merges the parts into the destination in index order and deletes them
    ///
    /// The first failing chunk decides the returned error. On such a failure the
    /// destination is left untouched.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rangefetch::{DownloadConfig, DownloadRequest, Downloader};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let downloader = Downloader::http(DownloadConfig::default())?;
    /// let request = DownloadRequest::new("https://example.com/big.iso", "big.iso");
    /// let summary = downloader.download_file(&request).await?;
    /// println!("{} bytes in {} chunks", summary.size, summary.chunks);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn download_file(
        &self,
        request: &DownloadRequest,
    ) -> Result<DownloadSummary, DownloadError> {
        let started = Instant::now();

        match self.run(request).await {
            Ok((size, chunks)) => {
                let summary = DownloadSummary {
                    size,
                    chunks,
                    elapsed: started.elapsed(),
                };
                info!(
                    "Done: {} ({} bytes, {} chunk(s))",
                    request.destination.display(),
                    summary.size,
                    summary.chunks
                );
                Ok(summary)
            }
            Err(e) => {
                error!("Download of {} failed: {}", request.url, e);
                Err(e)
            }
        }
    }

    /// Returns the file size and chunk count on success.
    async fn run(&self, request: &DownloadRequest) -> Result<(u64, usize), DownloadError> {
        let plan = self.plan(&request.url).await?;
        let destination = request.destination.as_path();

        if plan.is_empty() {
            info!("Remote file is empty, creating {}", destination.display());
            self.store.save(destination, &[]).await?;
            if let Some(pb) = &self.progress {
                pb.finish_with_message("Empty file created");
            }
            return Ok((0, 0));
        }

        if let Some(pb) = &self.progress {
            pb.set_length(plan.len() as u64);
            pb.set_position(0);
            pb.set_message(format!("Downloading {} chunks", plan.len()));
        }

        info!("Fetching {} chunk(s)", plan.len());
        self.fetch_chunks(&request.url, destination, &plan).await?;

        info!("Reassembling {}", destination.display());
        if let Some(pb) = &self.progress {
            pb.set_position(0);
            pb.set_message("Merging chunks");
        }
        let merged = reassemble(
            self.store.as_ref(),
            destination,
            plan.len(),
            self.progress.as_ref(),
        )
        .await;
        if let Err(e) = merged {
            if let Some(pb) = &self.progress {
                pb.abandon_with_message("Merge failed");
            }
            return Err(e);
        }

        if let Some(pb) = &self.progress {
            pb.finish_with_message("Download complete");
        }
        Ok((plan.size, plan.len()))
    }

    /// Spawns one task per chunk and waits for all of them or the first failure.
    async fn fetch_chunks(
        &self,
        url: &str,
        destination: &Path,
        plan: &ChunkPlan,
    ) -> Result<(), DownloadError> {
        let url: Arc<str> = Arc::from(url);
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();

        for &chunk in &plan.chunks {
            tasks.spawn(fetch_chunk(
                Arc::clone(&self.fetcher),
                Arc::clone(&self.store),
                Arc::clone(&url),
                part_path(destination, chunk.index),
                chunk,
                cancel.clone(),
                self.progress.clone(),
            ));
        }

        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let result = joined.unwrap_or_else(|e| Err(DownloadError::TaskFailed(e.to_string())));
            if let Err(e) = result {
                first_error = Some(e);
                break;
            }
        }

        let Some(err) = first_error else {
            return Ok(());
        };

        warn!("Chunk fetch failed, {} task(s) still running: {}", tasks.len(), err);
        if let Some(pb) = &self.progress {
            pb.abandon_with_message("Download failed");
        }
        if self.config.cancel_on_failure {
            cancel.cancel();
        }

        if self.config.cleanup_on_failure {
            // Parts written after the cleanup pass would be orphaned.
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(Err(DownloadError::Cancelled)) | Ok(Ok(())) => {}
                    Ok(Err(e)) => debug!("Discarding later chunk error: {}", e),
                    Err(e) => debug!("Discarding chunk task join error: {}", e),
                }
            }
            self.remove_parts(destination, plan.len()).await;
        } else {
            tasks.detach_all();
        }

        Err(err)
    }

    /// Best-effort removal of every `.partN` file of `destination`.
    async fn remove_parts(&self, destination: &Path, chunk_count: usize) {
        let mut removed = 0usize;
        for index in 0..chunk_count {
            let part: PathBuf = part_path(destination, index);
            match self.store.delete(&part).await {
                Ok(()) => removed += 1,
                Err(e) if e.is_not_found() => {}
                Err(e) => warn!("Failed to remove {}: {}", part.display(), e),
            }
        }
        debug!("Removed {} leftover part file(s)", removed);
    }
}

/// Fetches one chunk and stores it under its part path.
async fn fetch_chunk(
    fetcher: Arc<dyn RangeFetcher>,
    store: Arc<dyn BlobStore>,
    url: Arc<str>,
    part: PathBuf,
    chunk: ChunkSpec,
    cancel: CancellationToken,
    pb: Option<indicatif::ProgressBar>,
) -> Result<(), DownloadError> {
    debug!("Fetching chunk {} ({})", chunk.index, chunk.range_header());

    let data = tokio::select! {
        _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
        result = fetcher.fetch_range(&url, chunk.start, chunk.end) => result?,
    };

    if data.len() as u64 != chunk.len() {
        return Err(DownloadError::Protocol(format!(
            "chunk {} returned {} bytes, expected {} for {}",
            chunk.index,
            data.len(),
            chunk.len(),
            chunk.range_header()
        )));
    }

    store.save(&part, &data).await?;
    debug!("Stored chunk {} at {}", chunk.index, part.display());

    if let Some(pb) = pb {
        pb.inc(1);
    }
    Ok(())
}

/// Downloads `url` to `destination` over HTTP with the default configuration.
pub async fn download_file(
    url: &str,
    destination: impl Into<PathBuf>,
) -> Result<DownloadSummary, DownloadError> {
    Downloader::http(DownloadConfig::default())?
        .download_file(&DownloadRequest::new(url, destination))
        .await
}
