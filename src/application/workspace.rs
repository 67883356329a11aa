//! Scratch space of a pipeline run under the worker's temporary-storage root.

use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

/// Name prefix of downloaded source files in the work root.
pub(crate) const SOURCE_PREFIX: &str = "source-";
/// Name suffix of downloaded source files in the work root.
pub(crate) const SOURCE_SUFFIX: &str = ".tmp";

/// Per-video output directory, removed recursively when dropped.
///
/// Removal on drop is a blocking filesystem call on the current thread.
#[derive(Debug)]
pub struct WorkingDir {
    path: PathBuf,
}

impl WorkingDir {
    /// Create `root/<name>`, replacing whatever a previous run left there.
    pub async fn create(root: &Path, name: &str) -> io::Result<Self> {
        let mut components = Path::new(name).components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("`{}` is not a plain directory name", name),
            ));
        }

        let path = root.join(name);
        if tokio::fs::try_exists(&path).await? {
            tokio::fs::remove_dir_all(&path).await?;
        }

        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o700);
        builder.create(&path).await?;

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkingDir {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove working directory"
            ),
        }
    }
}

/// Delete what a crashed run left under `root`, creating `root` if needed.
///
/// Only the worker's own artifacts are touched: downloaded `source-*.tmp`
/// files and working directories named after a video id. Returns the number
/// of removed entries.
pub async fn sweep(root: &Path) -> io::Result<usize> {
    tokio::fs::create_dir_all(root).await?;

    let mut removed = 0;
    let mut entries = tokio::fs::read_dir(root).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let file_type = entry.file_type().await?;
        if file_type.is_dir() && Uuid::parse_str(name).is_ok() {
            tokio::fs::remove_dir_all(entry.path()).await?;
        } else if file_type.is_file() && is_source_file(name) {
            tokio::fs::remove_file(entry.path()).await?;
        } else {
            continue;
        }
        removed += 1;
    }

    if removed > 0 {
        info!(root = %root.display(), removed, "Swept stale temporary files");
    }
    Ok(removed)
}

fn is_source_file(name: &str) -> bool {
    name.starts_with(SOURCE_PREFIX) && name.ends_with(SOURCE_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_working_dir_removed_on_drop() {
        let root = tempdir().unwrap();
        let dir = WorkingDir::create(root.path(), "v1").await.unwrap();
        std::fs::write(dir.path().join("quality_480x270.m3u8"), "#EXTM3U").unwrap();

        let path = dir.path().to_path_buf();
        assert_eq!(path, root.path().join("v1"));
        drop(dir);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_working_dir_replaces_stale_content() {
        let root = tempdir().unwrap();
        let stale = root.path().join("v1");
        std::fs::create_dir(&stale).unwrap();
        std::fs::write(stale.join("quality_480x2700.ts"), "old").unwrap();

        let dir = WorkingDir::create(root.path(), "v1").await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_working_dir_rejects_path_like_names() {
        let root = tempdir().unwrap();
        for name in ["", ".", "..", "a/b", "/abs"] {
            let result = WorkingDir::create(root.path(), name).await;
            assert!(result.is_err(), "name {:?} was accepted", name);
        }
    }

    #[tokio::test]
    async fn test_sweep_removes_leftovers() {
        let parent = tempdir().unwrap();
        let root = parent.path().join("vidlink");

        assert_eq!(sweep(&root).await.unwrap(), 0);
        assert!(root.is_dir());

        let stale = root.join(Uuid::new_v4().to_string());
        std::fs::create_dir_all(&stale).unwrap();
        std::fs::write(stale.join("quality_480x270.m3u8"), "x").unwrap();
        std::fs::write(root.join("source-abc.tmp"), "x").unwrap();

        assert_eq!(sweep(&root).await.unwrap(), 2);
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_sweep_keeps_unrelated_entries() {
        let root = tempdir().unwrap();
        std::fs::create_dir(root.path().join("systemd-private")).unwrap();
        std::fs::write(root.path().join("notes.txt"), "keep").unwrap();
        std::fs::write(root.path().join("source-abc.partial"), "keep").unwrap();
        std::fs::write(root.path().join(Uuid::new_v4().to_string()), "plain file").unwrap();
        std::fs::write(root.path().join("source-abc.tmp"), "x").unwrap();

        assert_eq!(sweep(root.path()).await.unwrap(), 1);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 4);
        assert!(!root.path().join("source-abc.tmp").exists());
    }
}
