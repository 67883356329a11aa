//! Vidlink Worker Binary
//!
//! Long-running process that:
//! 1. Connects to PostgreSQL and the S3-compatible blob store.
//! 2. Clears leftovers of a previous run from the working directory.
//! 3. Processes at most one uploaded video per tick until SIGINT/SIGTERM.
//!
//! Environment Variables:
//! - DATABASE_URL: PostgreSQL connection URL
//! - SPACES_ENDPOINT, SPACES_BUCKET, SPACES_KEY, SPACES_SECRET: blob store
//! - SPACES_REGION: signing region (default us-east-1)
//! - SPACES_CDN_URL: public CDN base URL
//! - VIDLINK_WORK_DIR: temporary storage root (default $TMPDIR/vidlink)
//! - FFMPEG_BIN: transcoder executable (default ffmpeg)
//! - RUST_LOG: log filter (default vidlink=info)

use sqlx::postgres::PgPoolOptions;
use std::error::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vidlink::adapters::ffmpeg::FfmpegTranscoder;
use vidlink::adapters::postgres::PgVideoRepository;
use vidlink::adapters::s3::S3BlobStore;
use vidlink::application::{sweep, PipelineRunner, Scheduler, TICK_INTERVAL};
use vidlink::config::WorkerConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = WorkerConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vidlink=info")),
        )
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await?;
    info!("Connected to database");

    let removed = sweep(&config.work_dir).await?;
    info!(work_dir = %config.work_dir.display(), removed, "Working directory ready");

    let storage = S3BlobStore::connect(&config.storage, config.work_dir.clone()).await;
    let transcoder = FfmpegTranscoder::new(config.ffmpeg_bin.clone());
    let repo = PgVideoRepository::new(pool);
    let runner = PipelineRunner::new(storage, transcoder, repo, config.work_dir.clone());

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    let stats = Scheduler::new(runner, TICK_INTERVAL).run(shutdown).await;
    info!(
        ticks = stats.ticks,
        succeeded = stats.succeeded,
        failed = stats.failed,
        skipped = stats.skipped,
        "Worker stopped"
    );
    Ok(())
}

/// Cancel `token` on Ctrl+C or SIGTERM.
async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
    token.cancel();
}
