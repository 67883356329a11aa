//! HLS transcoding through an external `ffmpeg` process.

use crate::domain::rendition::Resolution;
use crate::error::TranscodeError;
use crate::ports::transcoder::Transcoder;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Segment length of every rendition, in seconds.
pub const SEGMENT_SECONDS: u32 = 10;

/// Bytes of stderr kept in a failure report.
const STDERR_TAIL: usize = 2048;

#[derive(Clone, Debug)]
pub struct FfmpegTranscoder {
    program: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run_one(
        &self,
        input: &Path,
        output_dir: &Path,
        resolution: Resolution,
    ) -> Result<(), TranscodeError> {
        let args = hls_args(input, output_dir, resolution);
        debug!(program = ?self.program, ?args, "Running transcoder");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| TranscodeError::Spawn { resolution, source })?;

        if !output.status.success() {
            return Err(TranscodeError::Exit {
                resolution,
                status: output.status,
                stderr: stderr_tail(&output.stderr),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output_dir: &Path,
        resolutions: &[Resolution],
    ) -> Result<(), TranscodeError> {
        create_output_dir(output_dir).await?;

        for &resolution in resolutions {
            self.run_one(input, output_dir, resolution).await?;
            info!(
                input = %input.display(),
                output = %output_dir.join(resolution.manifest_name()).display(),
                "Converted rendition"
            );
        }
        Ok(())
    }
}

/// Arguments for one rendition:
/// `-i <in> -c:v libx264 -c:a aac -f hls -hls_time 10 -hls_list_size 0 -vf scale=WxH <out>`.
pub fn hls_args(input: &Path, output_dir: &Path, resolution: Resolution) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-hide_banner".into(), "-y".into(), "-i".into()];
    args.push(input.as_os_str().to_owned());
    for arg in [
        "-c:v",
        "libx264",
        "-c:a",
        "aac",
        "-strict",
        "-2",
        "-f",
        "hls",
        "-hls_time",
    ] {
        args.push(arg.into());
    }
    args.push(SEGMENT_SECONDS.to_string().into());
    args.push("-hls_list_size".into());
    args.push("0".into());
    args.push("-vf".into());
    args.push(resolution.scale_filter().into());
    args.push(output_dir.join(resolution.manifest_name()).into_os_string());
    args
}

async fn create_output_dir(path: &Path) -> Result<(), TranscodeError> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o700);
    builder
        .create(path)
        .await
        .map_err(|source| TranscodeError::OutputDir {
            path: path.to_path_buf(),
            source,
        })
}

fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}
