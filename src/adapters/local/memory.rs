use crate::domain::video::{Video, VideoId};
use crate::error::{CommitError, SelectionError};
use crate::ports::repository::VideoRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// In-process video repository, kept in insertion order.
#[derive(Debug, Default)]
pub struct MemoryVideoRepository {
    videos: Mutex<Vec<Video>>,
}

impl MemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, video: Video) {
        self.lock().push(video);
    }

    pub fn get(&self, id: &VideoId) -> Option<Video> {
        self.lock().iter().find(|v| &v.id == id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Video>> {
        // Every mutation is a single field write, so a poisoned guard is still consistent.
        self.videos.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl VideoRepository for MemoryVideoRepository {
    async fn next_eligible(&self) -> Result<Option<Video>, SelectionError> {
        // Oldest upload first, ties broken by insertion order.
        Ok(self
            .lock()
            .iter()
            .filter(|v| v.is_eligible())
            .min_by_key(|v| v.uploaded_at)
            .cloned())
    }

    async fn find(&self, id: &VideoId) -> Result<Option<Video>, SelectionError> {
        Ok(self.get(id))
    }

    async fn mark_processed(&self, id: &VideoId) -> Result<(), CommitError> {
        let mut videos = self.lock();
        let video = videos
            .iter_mut()
            .find(|v| &v.id == id)
            .ok_or_else(|| CommitError::NotFound(id.clone()))?;
        video.processed = true;
        video.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_uploaded(&self, id: &VideoId, at: DateTime<Utc>) -> Result<(), CommitError> {
        let mut videos = self.lock();
        let video = videos
            .iter_mut()
            .find(|v| &v.id == id)
            .ok_or_else(|| CommitError::NotFound(id.clone()))?;
        if video.uploaded_at.is_some() {
            return Err(CommitError::AlreadyUploaded(id.clone()));
        }
        video.uploaded_at = Some(at);
        video.updated_at = Utc::now();
        Ok(())
    }
}
