//! Download, transcode, upload and commit for one eligible video.

use super::workspace::WorkingDir;
use crate::domain::rendition::{Resolution, RENDITIONS};
use crate::domain::video::{Video, VideoId};
use crate::error::{CommitError, SelectionError, TranscodeError, TransferError};
use crate::ports::repository::VideoRepository;
use crate::ports::storage::BlobStore;
use crate::ports::transcoder::Transcoder;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Select,
    Download,
    Transcode,
    Upload,
    Commit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Select => "select",
            Stage::Download => "download",
            Stage::Transcode => "transcode",
            Stage::Upload => "upload",
            Stage::Commit => "commit",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("failed to prepare working directory: {0}")]
    Workspace(#[source] std::io::Error),

    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    #[error(transparent)]
    Commit(#[from] CommitError),
}

/// Result of one pipeline invocation.
#[derive(Debug)]
pub enum Outcome {
    /// No eligible video this tick.
    Skipped,
    Succeeded(VideoId),
    /// `video_id` is `None` when the selection query itself failed.
    Failed {
        video_id: Option<VideoId>,
        stage: Stage,
        error: PipelineError,
    },
}

impl Outcome {
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            Outcome::Failed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Anything the scheduling loop can drive once per tick.
#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn run(&self) -> Outcome;
}

pub struct PipelineRunner<S, T, R> {
    storage: S,
    transcoder: T,
    repo: R,
    work_root: PathBuf,
    renditions: Vec<Resolution>,
}

impl<S, T, R> PipelineRunner<S, T, R>
where
    S: BlobStore,
    T: Transcoder,
    R: VideoRepository,
{
    /// `work_root` holds the per-video working directories.
    pub fn new(storage: S, transcoder: T, repo: R, work_root: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            transcoder,
            repo,
            work_root: work_root.into(),
            renditions: RENDITIONS.to_vec(),
        }
    }

    /// Select at most one eligible video and take it through every stage.
    pub async fn run_once(&self) -> Outcome {
        let video = match self.repo.next_eligible().await {
            Ok(Some(video)) => video,
            Ok(None) => return Outcome::Skipped,
            Err(e) => {
                return Outcome::Failed {
                    video_id: None,
                    stage: Stage::Select,
                    error: e.into(),
                }
            }
        };

        let id = video.id.clone();
        match self.process(video).await {
            Ok(()) => Outcome::Succeeded(id),
            Err((stage, error)) => Outcome::Failed {
                video_id: Some(id),
                stage,
                error,
            },
        }
    }

    // The downloaded source and the working directory are both dropped,
    // and thereby deleted, on every return path.
    async fn process(&self, mut video: Video) -> Result<(), (Stage, PipelineError)> {
        let key = video.id.to_string();

        info!(video_id = %key, "Downloading source from blob store");
        let source = self
            .storage
            .get(&key)
            .await
            .map_err(at(Stage::Download))?;

        let workdir = WorkingDir::create(&self.work_root, &key)
            .await
            .map_err(|e| (Stage::Transcode, PipelineError::Workspace(e)))?;

        info!(
            video_id = %key,
            source = %source.display(),
            output = %workdir.path().display(),
            "Converting source"
        );
        self.transcoder
            .transcode(&source, workdir.path(), &self.renditions)
            .await
            .map_err(at(Stage::Transcode))?;

        info!(video_id = %key, "Uploading renditions");
        let uploaded = self
            .storage
            .put_tree(&video.id.rendition_prefix(), workdir.path())
            .await
            .map_err(at(Stage::Upload))?;

        video.processed = true;
        self.repo
            .mark_processed(&video.id)
            .await
            .map_err(at(Stage::Commit))?;

        info!(
            video_id = %key,
            objects = uploaded,
            processed = video.processed,
            "Video processed"
        );
        Ok(())
    }
}

#[async_trait]
impl<S, T, R> Pipeline for PipelineRunner<S, T, R>
where
    S: BlobStore,
    T: Transcoder,
    R: VideoRepository,
{
    async fn run(&self) -> Outcome {
        self.run_once().await
    }
}

fn at<E: Into<PipelineError>>(stage: Stage) -> impl FnOnce(E) -> (Stage, PipelineError) {
    move |e| (stage, e.into())
}
