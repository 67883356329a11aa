use crate::domain::video::{Video, VideoId};
use crate::error::{CommitError, SelectionError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Durable store of video records.
///
/// The pipeline reads eligible records and commits exactly one mutation per
/// successful run. Implementations do not lock; concurrent writers must be
/// serialized by the backing store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// First video with `processed = false` and a non-null `uploaded_at`,
    /// or `None` when nothing is eligible.
    async fn next_eligible(&self) -> Result<Option<Video>, SelectionError>;

    /// Current state of one video, `None` if it does not exist.
    async fn find(&self, id: &VideoId) -> Result<Option<Video>, SelectionError>;

    /// Set `processed = true`. Never reverted.
    async fn mark_processed(&self, id: &VideoId) -> Result<(), CommitError>;

    /// Record that the original upload is durably stored. Only succeeds once.
    async fn mark_uploaded(&self, id: &VideoId, at: DateTime<Utc>) -> Result<(), CommitError>;
}

#[async_trait]
impl<T: VideoRepository + ?Sized> VideoRepository for Arc<T> {
    async fn next_eligible(&self) -> Result<Option<Video>, SelectionError> {
        (**self).next_eligible().await
    }

    async fn find(&self, id: &VideoId) -> Result<Option<Video>, SelectionError> {
        (**self).find(id).await
    }

    async fn mark_processed(&self, id: &VideoId) -> Result<(), CommitError> {
        (**self).mark_processed(id).await
    }

    async fn mark_uploaded(&self, id: &VideoId, at: DateTime<Utc>) -> Result<(), CommitError> {
        (**self).mark_uploaded(id, at).await
    }
}
