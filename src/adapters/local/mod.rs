//! Local adapters for single-host runs and tests.

pub mod fs;
pub mod memory;

pub use fs::FsBlobStore;
pub use memory::MemoryVideoRepository;
