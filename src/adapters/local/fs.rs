use crate::application::workspace::{SOURCE_PREFIX, SOURCE_SUFFIX};
use crate::error::TransferError;
use crate::ports::storage::BlobStore;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tempfile::TempPath;

/// Blob store backed by a flat local directory.
///
/// Keys are stored as single file names with `%` and `/` escaped, so an
/// object `v1` and the objects under `v1/` can coexist like they do in S3.
#[derive(Clone, Debug)]
pub struct FsBlobStore {
    root: PathBuf,
    scratch_dir: PathBuf,
}

impl FsBlobStore {
    /// `scratch_dir` receives the temp files handed out by `get`.
    pub fn new(root: impl Into<PathBuf>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Local file holding the object stored under `key`.
    pub fn object_path(&self, key: &str) -> Result<PathBuf, TransferError> {
        let valid = !key.is_empty()
            && Path::new(key)
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(TransferError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.root.join(escape_key(key)))
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Result<Vec<String>, TransferError> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| TransferError::io(&self.root, e))?;
        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TransferError::io(&self.root, e))?;
            if entry.path().is_file() {
                keys.push(unescape_key(&entry.file_name().to_string_lossy()));
            }
        }
        keys.sort();
        Ok(keys)
    }
}

fn escape_key(key: &str) -> String {
    key.replace('%', "%25").replace('/', "%2F")
}

fn unescape_key(name: &str) -> String {
    name.replace("%2F", "/").replace("%25", "%")
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn get(&self, key: &str) -> Result<TempPath, TransferError> {
        let source = self.object_path(key)?;
        if !tokio::fs::try_exists(&source)
            .await
            .map_err(|e| TransferError::io(&source, e))?
        {
            return Err(TransferError::NotFound {
                key: key.to_string(),
            });
        }

        let temp = tempfile::Builder::new()
            .prefix(SOURCE_PREFIX)
            .suffix(SOURCE_SUFFIX)
            .tempfile_in(&self.scratch_dir)
            .map_err(|e| TransferError::io(&self.scratch_dir, e))?
            .into_temp_path();

        tokio::fs::copy(&source, &temp)
            .await
            .map_err(|e| TransferError::io(&source, e))?;
        Ok(temp)
    }

    async fn put(&self, key: &str, local_path: &Path, _public: bool) -> Result<(), TransferError> {
        let target = self.object_path(key)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| TransferError::io(&self.root, e))?;
        tokio::fs::copy(local_path, &target)
            .await
            .map_err(|e| TransferError::io(local_path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, tempfile::TempDir, FsBlobStore) {
        let bucket = tempdir().unwrap();
        let scratch = tempdir().unwrap();
        let store = FsBlobStore::new(bucket.path(), scratch.path());
        (bucket, scratch, store)
    }

    #[tokio::test]
    async fn test_get_copies_into_scratch_temp_file() {
        let (bucket, scratch, store) = store();
        fs::write(bucket.path().join("v1"), b"source bytes").unwrap();

        let temp = store.get("v1").await.unwrap();
        assert!(temp.starts_with(scratch.path()));
        assert_eq!(fs::read(&temp).unwrap(), b"source bytes");

        let path = temp.to_path_buf();
        drop(temp);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_get_missing_object() {
        let (_bucket, _scratch, store) = store();
        let result = store.get("nope").await;
        assert!(matches!(result, Err(TransferError::NotFound { key }) if key == "nope"));
    }

    #[tokio::test]
    async fn test_original_and_renditions_coexist() {
        let (bucket, scratch, store) = store();
        let local = scratch.path().join("manifest");
        fs::write(&local, "#EXTM3U").unwrap();

        store.put("v1", &local, false).await.unwrap();
        store.put("v1/quality_480x270.m3u8", &local, true).await.unwrap();

        let stored = store.object_path("v1/quality_480x270.m3u8").unwrap();
        assert!(stored.starts_with(bucket.path()));
        assert_eq!(fs::read_to_string(stored).unwrap(), "#EXTM3U");
        assert_eq!(store.keys().unwrap(), vec!["v1", "v1/quality_480x270.m3u8"]);
    }

    #[test]
    fn test_escaping_is_reversible() {
        for key in ["v1", "v1/quality_480x270.m3u8", "50%/a%2Fb"] {
            assert_eq!(unescape_key(&escape_key(key)), key);
        }
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let (_bucket, scratch, store) = store();
        let local = scratch.path().join("f");
        fs::write(&local, "x").unwrap();

        for key in ["../outside", "/etc/passwd", "v1/../../x", ""] {
            let result = store.put(key, &local, false).await;
            assert!(
                matches!(result, Err(TransferError::InvalidKey { .. })),
                "key {:?} was accepted",
                key
            );
        }
    }

    #[tokio::test]
    async fn test_put_tree_mirrors_directory() {
        let (bucket, scratch, store) = store();
        let out = scratch.path().join("out");
        fs::create_dir(&out).unwrap();
        fs::write(out.join("quality_480x270.m3u8"), "m").unwrap();
        fs::write(out.join("quality_480x2700.ts"), "s").unwrap();

        let uploaded = store.put_tree("v1/", &out).await.unwrap();

        assert_eq!(uploaded, 2);
        assert_eq!(
            store.keys().unwrap(),
            vec!["v1/quality_480x270.m3u8", "v1/quality_480x2700.ts"]
        );
        assert!(bucket.path().join("v1%2Fquality_480x270.m3u8").is_file());
    }
}
