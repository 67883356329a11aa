use crate::domain::rendition::Resolution;
use crate::error::TranscodeError;
use async_trait::async_trait;
use std::path::Path;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Produce one HLS rendition per resolution into `output_dir`, in order.
    /// Stops at the first failing resolution; earlier output stays on disk.
    async fn transcode(
        &self,
        input: &Path,
        output_dir: &Path,
        resolutions: &[Resolution],
    ) -> Result<(), TranscodeError>;
}
