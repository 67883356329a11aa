//! Application layer - Generic services that use ports.

pub mod ingest;
pub mod pipeline;
pub mod scheduler;
pub mod workspace;

pub use ingest::{IngestError, IngestService};
pub use pipeline::{Outcome, Pipeline, PipelineError, PipelineRunner, Stage};
pub use scheduler::{LoopStats, Scheduler, TICK_INTERVAL};
pub use workspace::{sweep, WorkingDir};
