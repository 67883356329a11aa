//! Timer-driven loop that runs the pipeline once per tick until shutdown.

use super::pipeline::{Outcome, Pipeline};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Period of the production scheduler.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Counters for one scheduler lifetime.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopStats {
    pub ticks: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl LoopStats {
    fn record(&mut self, outcome: &Outcome) {
        self.ticks += 1;
        match outcome {
            Outcome::Skipped => self.skipped += 1,
            Outcome::Succeeded(_) => self.succeeded += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
    }
}

pub struct Scheduler<P> {
    pipeline: P,
    interval: Duration,
}

impl<P: Pipeline> Scheduler<P> {
    /// `interval` must be non-zero.
    pub fn new(pipeline: P, interval: Duration) -> Self {
        Self { pipeline, interval }
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// A pipeline run is awaited in place, so runs never overlap and a
    /// shutdown request is only honoured between runs. Ticks that fall due
    /// during a long run collapse into one immediate tick instead of queueing.
    pub async fn run(&self, shutdown: CancellationToken) -> LoopStats {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut stats = LoopStats::default();

        info!(interval = ?self.interval, "Video scheduler started");
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Received shutdown signal. Stopping...");
                    break;
                }
                _ = ticker.tick() => {
                    let outcome = self.pipeline.run().await;
                    log_outcome(&outcome);
                    stats.record(&outcome);
                }
            }
        }
        stats
    }
}

fn log_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Skipped => debug!("No video needs processing"),
        Outcome::Succeeded(video_id) => info!(%video_id, "Pipeline run succeeded"),
        Outcome::Failed {
            video_id: Some(video_id),
            stage,
            error,
        } => error!(%video_id, %stage, %error, "Pipeline run failed"),
        Outcome::Failed {
            video_id: None,
            stage,
            error,
        } => error!(%stage, %error, "Pipeline run failed"),
    }
}
