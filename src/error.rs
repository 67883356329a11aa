//! Error types for the processing pipeline.

use crate::domain::rendition::Resolution;
use crate::domain::video::VideoId;
use std::path::PathBuf;
use std::process::ExitStatus;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Blob-store get/put failure.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("object `{key}` not found")]
    NotFound { key: String },

    #[error("invalid object key `{key}`")]
    InvalidKey { key: String },

    #[error("blob store request for `{key}` failed: {source}")]
    Remote {
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("local I/O on {path:?} failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk {dir:?}: {source}")]
    Walk {
        dir: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl TransferError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TransferError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn remote(key: &str, source: impl Into<BoxError>) -> Self {
        TransferError::Remote {
            key: key.to_string(),
            source: source.into(),
        }
    }
}

/// External transcoder failure.
#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("failed to create output directory {path:?}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start transcoder for {resolution}: {source}")]
    Spawn {
        resolution: Resolution,
        #[source]
        source: std::io::Error,
    },

    #[error("transcoder exited with {status} for {resolution}: {stderr}")]
    Exit {
        resolution: Resolution,
        status: ExitStatus,
        stderr: String,
    },
}

impl TranscodeError {
    /// Rendition that was being produced when the failure happened.
    pub fn resolution(&self) -> Option<Resolution> {
        match self {
            TranscodeError::OutputDir { .. } => None,
            TranscodeError::Spawn { resolution, .. } | TranscodeError::Exit { resolution, .. } => {
                Some(*resolution)
            }
        }
    }
}

/// Reading video records failed. Finding nothing is not an error.
#[derive(Debug, thiserror::Error)]
#[error("failed to query videos: {0}")]
pub struct SelectionError(#[source] pub BoxError);

/// Persisting a record mutation failed.
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error("video {0} does not exist")]
    NotFound(VideoId),

    #[error("video {0} already has an upload timestamp")]
    AlreadyUploaded(VideoId),

    #[error("failed to update video {id}: {source}")]
    Database {
        id: VideoId,
        #[source]
        source: BoxError,
    },
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for SelectionError {
    fn from(err: sqlx::Error) -> Self {
        SelectionError(Box::new(err))
    }
}
