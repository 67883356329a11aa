use crate::error::TransferError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempPath;
use walkdir::WalkDir;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Download an object into a fresh local temp file.
    /// The file is deleted when the returned path is dropped.
    async fn get(&self, key: &str) -> Result<TempPath, TransferError>;

    /// Upload a local file, optionally readable by anyone.
    async fn put(&self, key: &str, local_path: &Path, public: bool) -> Result<(), TransferError>;

    /// Upload every regular file below `local_dir` as a public object keyed
    /// `key_prefix + relative path`. Returns the number of objects written.
    ///
    /// The directory walk runs on the blocking pool. Objects uploaded before a
    /// failure are left in place.
    async fn put_tree(&self, key_prefix: &str, local_dir: &Path) -> Result<usize, TransferError> {
        let dir = local_dir.to_path_buf();
        let files = tokio::task::spawn_blocking(move || collect_files(&dir))
            .await
            .map_err(|e| {
                TransferError::io(local_dir, std::io::Error::new(std::io::ErrorKind::Other, e))
            })??;
        for (relative_key, path) in &files {
            let key = format!("{}{}", key_prefix, relative_key);
            self.put(&key, path, true).await?;
        }
        Ok(files.len())
    }
}

#[async_trait]
impl<T: BlobStore + ?Sized> BlobStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<TempPath, TransferError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, local_path: &Path, public: bool) -> Result<(), TransferError> {
        (**self).put(key, local_path, public).await
    }

    async fn put_tree(&self, key_prefix: &str, local_dir: &Path) -> Result<usize, TransferError> {
        (**self).put_tree(key_prefix, local_dir).await
    }
}

/// Regular files below `dir` in file-name order, paired with their
/// `/`-separated path relative to `dir`.
pub fn collect_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, TransferError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| TransferError::Walk {
            dir: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(dir).map_err(|_| {
            TransferError::io(
                entry.path(),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "entry outside of walk root"),
            )
        })?;
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push((key, entry.into_path()));
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::{eq, function};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_collect_files_skips_directories() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("quality_480x270.m3u8"), "#EXTM3U").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("seg0.ts"), "ts").unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();

        let keys: Vec<String> = collect_files(dir.path())
            .unwrap()
            .into_iter()
            .map(|(key, _)| key)
            .collect();

        assert_eq!(keys, vec!["nested/seg0.ts", "quality_480x270.m3u8"]);
    }

    #[test]
    fn test_collect_files_missing_dir() {
        let dir = tempdir().unwrap();
        let result = collect_files(&dir.path().join("gone"));
        assert!(matches!(result, Err(TransferError::Walk { .. })));
    }

    struct PutOnly(MockBlobStore);

    #[async_trait]
    impl BlobStore for PutOnly {
        async fn get(&self, key: &str) -> Result<TempPath, TransferError> {
            self.0.get(key).await
        }

        async fn put(
            &self,
            key: &str,
            local_path: &Path,
            public: bool,
        ) -> Result<(), TransferError> {
            self.0.put(key, local_path, public).await
        }
    }

    #[tokio::test]
    async fn test_put_tree_uploads_public_objects_under_prefix() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.m3u8"), "a").unwrap();
        fs::write(dir.path().join("a0.ts"), "b").unwrap();
        let manifest = dir.path().join("a.m3u8");
        let segment = dir.path().join("a0.ts");

        let mut mock = MockBlobStore::new();
        mock.expect_put()
            .with(eq("v1/a.m3u8"), function(move |p: &Path| p == manifest), eq(true))
            .times(1)
            .returning(|_, _, _| Ok(()));
        mock.expect_put()
            .with(eq("v1/a0.ts"), function(move |p: &Path| p == segment), eq(true))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let uploaded = PutOnly(mock).put_tree("v1/", dir.path()).await.unwrap();
        assert_eq!(uploaded, 2);
    }

    #[tokio::test]
    async fn test_put_tree_reports_walk_failure() {
        let dir = tempdir().unwrap();
        let mut mock = MockBlobStore::new();
        mock.expect_put().never();

        let result = PutOnly(mock).put_tree("v1/", &dir.path().join("gone")).await;
        assert!(matches!(result, Err(TransferError::Walk { .. })));
    }

    #[tokio::test]
    async fn test_put_tree_stops_at_first_failure() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.m3u8"), "a").unwrap();
        fs::write(dir.path().join("b.m3u8"), "b").unwrap();

        let mut mock = MockBlobStore::new();
        mock.expect_put()
            .times(1)
            .returning(|key, _, _| Err(TransferError::remote(key, "connection reset")));

        let result = PutOnly(mock).put_tree("v1/", dir.path()).await;
        assert!(matches!(result, Err(TransferError::Remote { key, .. }) if key == "v1/a.m3u8"));
    }
}
