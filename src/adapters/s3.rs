//! S3-compatible blob store (AWS S3, DigitalOcean Spaces, MinIO).

use crate::application::workspace::{SOURCE_PREFIX, SOURCE_SUFFIX};
use crate::config::StorageConfig;
use crate::error::TransferError;
use crate::ports::storage::BlobStore;
use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// S3BlobStore implements BlobStore for any S3-compatible endpoint.
#[derive(Clone, Debug)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    scratch_dir: PathBuf,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: String, scratch_dir: PathBuf) -> Self {
        Self {
            client,
            bucket,
            scratch_dir,
        }
    }

    /// Build a client with static credentials against the configured endpoint.
    pub async fn connect(config: &StorageConfig, scratch_dir: PathBuf) -> Self {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "vidlink-environment",
        );
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint)
            .credentials_provider(credentials)
            .load()
            .await;
        // Virtual-hosted style: <bucket>.<endpoint>
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(false)
            .build();

        Self::new(
            Client::from_conf(s3_config),
            config.bucket.clone(),
            scratch_dir,
        )
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn get(&self, key: &str) -> Result<TempPath, TransferError> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    TransferError::NotFound {
                        key: key.to_string(),
                    }
                } else {
                    TransferError::remote(key, e)
                }
            })?;

        let (file, path) = tempfile::Builder::new()
            .prefix(SOURCE_PREFIX)
            .suffix(SOURCE_SUFFIX)
            .tempfile_in(&self.scratch_dir)
            .map_err(|e| TransferError::io(&self.scratch_dir, e))?
            .into_parts();

        let mut writer = tokio::io::BufWriter::new(tokio::fs::File::from_std(file));
        let body = resp.body.into_async_read();
        tokio::pin!(body);
        let written = tokio::io::copy(&mut body, &mut writer)
            .await
            .map_err(|e| TransferError::io(path.to_path_buf(), e))?;
        writer
            .flush()
            .await
            .map_err(|e| TransferError::io(path.to_path_buf(), e))?;

        debug!(key, bytes = written, path = %path.display(), "Saved object to temp file");
        Ok(path)
    }

    async fn put(&self, key: &str, local_path: &Path, public: bool) -> Result<(), TransferError> {
        let body = ByteStream::from_path(local_path).await.map_err(|e| {
            TransferError::io(
                local_path,
                std::io::Error::new(std::io::ErrorKind::Other, e),
            )
        })?;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type_for(local_path))
            .body(body);
        if public {
            request = request.acl(ObjectCannedAcl::PublicRead);
        }
        request
            .send()
            .await
            .map_err(|e| TransferError::remote(key, e))?;

        debug!(key, bucket = %self.bucket, public, "Uploaded object");
        Ok(())
    }
}

/// MIME type announced for an uploaded file.
pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("m3u8") => "application/vnd.apple.mpegurl",
        Some("ts") => "video/mp2t",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(
            content_type_for(Path::new("v1/quality_480x270.m3u8")),
            "application/vnd.apple.mpegurl"
        );
        assert_eq!(
            content_type_for(Path::new("quality_480x2703.ts")),
            "video/mp2t"
        );
        assert_eq!(
            content_type_for(Path::new("source-abc.tmp")),
            "application/octet-stream"
        );
        assert_eq!(content_type_for(Path::new("v1")), "application/octet-stream");
    }
}
