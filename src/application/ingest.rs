//! Upload completion: the only hand-off from the web layer to the pipeline.

use crate::domain::video::VideoId;
use crate::error::{CommitError, SelectionError, TransferError};
use crate::ports::repository::VideoRepository;
use crate::ports::storage::BlobStore;
use chrono::Utc;
use std::path::Path;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Lookup(#[from] SelectionError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Commit(#[from] CommitError),
}

pub struct IngestService<S, R> {
    storage: S,
    repo: R,
}

impl<S, R> IngestService<S, R>
where
    S: BlobStore,
    R: VideoRepository,
{
    pub fn new(storage: S, repo: R) -> Self {
        Self { storage, repo }
    }

    /// Store the original file under the video's key, then stamp `uploaded_at`.
    ///
    /// Processing is left to the scheduler, which picks the video up on a
    /// later tick. If the upload fails the record stays ineligible. A video
    /// that already has an upload is rejected before its original is touched.
    pub async fn complete_upload(&self, id: &VideoId, source: &Path) -> Result<(), IngestError> {
        let video = self
            .repo
            .find(id)
            .await?
            .ok_or_else(|| CommitError::NotFound(id.clone()))?;
        if video.uploaded_at.is_some() {
            return Err(CommitError::AlreadyUploaded(id.clone()).into());
        }

        self.storage.put(id.as_str(), source, false).await?;
        self.repo.mark_uploaded(id, Utc::now()).await?;

        info!(video_id = %id, source = %source.display(), "Video uploaded");
        Ok(())
    }
}
