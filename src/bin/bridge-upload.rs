//! Upload one file through a running bulk-bridge server.

use anyhow::{Context, Result};
use bulk_bridge::client::{
    BridgeApi, FileInfo, FileSource, MAX_PART_SIZE, OverallStatus, PartUploader,
    SessionCoordinator, UploadSnapshot,
};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_MAX_CONCURRENCY: usize = 8;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Multipart upload through a bulk-bridge server"
)]
struct Args {
    /// File to upload
    file: PathBuf,

    /// Base URL of the bridge server
    #[arg(
        long,
        env = "BULK_BRIDGE_SERVER",
        default_value = "http://localhost:3000"
    )]
    server: String,

    /// Object key to store under (server generates one when omitted)
    #[arg(long)]
    key: Option<String>,

    /// Content type recorded on the object
    #[arg(long, default_value = "application/octet-stream")]
    content_type: String,

    /// Part size in bytes (at least 5 MiB)
    #[arg(
        long,
        default_value_t = MAX_PART_SIZE,
        value_parser = clap::value_parser!(u64).range(MAX_PART_SIZE..)
    )]
    part_size: u64,

    /// Maximum part uploads in flight; 0 starts every part at once
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENCY)]
    max_concurrency: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let source = FileSource::open(&args.file)
        .await
        .with_context(|| format!("opening {}", args.file.display()))?;
    let name = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("file path has no file name")?;

    let http = reqwest::Client::new();
    let coordinator = SessionCoordinator::new(
        BridgeApi::new(http.clone(), &args.server),
        PartUploader::new(http),
    )
    .with_part_size(args.part_size)
    .with_max_concurrency((args.max_concurrency > 0).then_some(args.max_concurrency));

    let mut updates = coordinator.subscribe();
    let reporter = tokio::spawn(async move {
        let mut last_completed = usize::MAX;
        while updates.changed().await.is_ok() {
            let snapshot: UploadSnapshot = updates.borrow_and_update().clone();
            if snapshot.completed_parts() != last_completed {
                last_completed = snapshot.completed_parts();
                tracing::info!(
                    "{}: {}/{} parts ({:.0}%)",
                    snapshot.file_name,
                    last_completed,
                    snapshot.total_parts(),
                    snapshot.overall_progress()
                );
            }
            if matches!(snapshot.status, OverallStatus::Success | OverallStatus::Error) {
                break;
            }
        }
    });

    let file = FileInfo {
        name,
        content_type: args.content_type,
        key: args.key,
    };
    let outcome = coordinator.upload(&file, &source).await;
    // The coordinator publishes the terminal status before returning.
    let _ = reporter.await;

    let done = outcome.context("upload failed")?;
    tracing::info!(
        "Uploaded {} as s3://{}/{} in {} parts",
        file.name,
        done.bucket,
        done.key,
        done.parts.len()
    );
    Ok(())
}
