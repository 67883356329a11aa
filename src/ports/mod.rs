//! Ports - Trait definitions for the pipeline's external collaborators.

pub mod repository;
pub mod storage;
pub mod transcoder;
