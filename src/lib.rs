//! Vidlink - Background video processing
//!
//! Hexagonal Architecture:
//! - domain/: Video records and rendition ladder
//! - ports/: Trait definitions (blob store, repository, transcoder)
//! - adapters/: Concrete implementations (ffmpeg, local, PostgreSQL, S3)
//! - application/: Pipeline, scheduler, upload ingest
//! - config: Environment configuration
//!
//! # Features
//! - `s3`: S3-compatible blob store
//! - `postgres`: PostgreSQL video repository
//!
//! The worker binary requires both.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

// Re-exports for convenience
pub use application::{Outcome, PipelineRunner, Scheduler, Stage};
pub use config::{StorageConfig, WorkerConfig};
pub use domain::rendition::{Resolution, RENDITIONS};
pub use domain::video::{Video, VideoId};
