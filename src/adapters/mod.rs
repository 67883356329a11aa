//! Adapters - Concrete implementations of ports.

pub mod ffmpeg;
pub mod local;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "s3")]
pub mod s3;
