use anyhow::Context;
use clap::Parser;
use rangefetch::{DownloadConfig, DownloadRequest, Downloader};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "rangefetch")]
#[command(about = "Download a file over HTTP in concurrent byte-range chunks", long_about = None)]
#[command(version)]
struct Args {
    /// URL of the file to download
    url: String,

    /// Destination path for the assembled file
    output: PathBuf,

    /// Smallest chunk size in bytes
    #[arg(long, default_value_t = rangefetch::types::DEFAULT_MIN_CHUNK_SIZE)]
    min_chunk_size: u64,

    /// Number of chunks to aim for on large files
    #[arg(long, default_value_t = rangefetch::types::DEFAULT_TARGET_CHUNKS)]
    target_chunks: u64,

    /// Force an exact chunk size in bytes
    #[arg(long)]
    chunk_size: Option<u64>,

    /// Connect timeout in seconds
    #[arg(long)]
    connect_timeout_secs: Option<u64>,

    /// Keep `.partN` files when a chunk fails
    #[arg(long)]
    keep_parts_on_failure: bool,

    /// Let in-flight chunks finish after a failure instead of cancelling them
    #[arg(long)]
    no_cancel: bool,

    /// Print the chunk plan as JSON and exit without downloading
    #[arg(long)]
    plan_only: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn download_config(&self) -> DownloadConfig {
        DownloadConfig {
            min_chunk_size: self.min_chunk_size,
            target_chunks: self.target_chunks,
            chunk_size: self.chunk_size,
            cancel_on_failure: !self.no_cancel,
            cleanup_on_failure: !self.keep_parts_on_failure,
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
            ..DownloadConfig::default()
        }
    }
}

/// Drops sub-millisecond precision so elapsed times print as e.g. `1s 250ms`.
fn whole_millis(elapsed: Duration) -> Duration {
    Duration::from_millis(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

async fn run(args: Args) -> anyhow::Result<()> {
    let downloader =
        Downloader::http(args.download_config()).context("failed to build HTTP client")?;

    if args.plan_only {
        let plan = downloader
            .plan(&args.url)
            .await
            .with_context(|| format!("failed to plan download of {}", args.url))?;
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let pb = indicatif::ProgressBar::new(0);
    pb.set_style(
        indicatif::ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg} | {elapsed_precise} elapsed")?
            .progress_chars("█▓▒░ "),
    );

    let request = DownloadRequest::new(args.url.clone(), args.output.clone());
    let summary = downloader
        .with_progress(pb)
        .download_file(&request)
        .await
        .with_context(|| format!("failed to download {}", args.url))?;

    info!(
        "✅ {} bytes in {} chunk(s), took {}",
        summary.size,
        summary.chunks,
        humantime::format_duration(whole_millis(summary.elapsed))
    );
    println!("The download has finished: {}", args.output.display());
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("rangefetch={}", log_level))
        .with_writer(std::io::stderr)
        .init();

    info!("🚀 rangefetch {}", args.url);

    if let Err(e) = run(args).await {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}
