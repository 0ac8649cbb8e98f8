//! Filesystem-backed storage rooted at a single directory.

use super::{LocatedStore, StorageBackend};
use crate::{Error, Result};
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct FsStorage {
    root: PathBuf,
    base_url: String,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn write_atomic(path: PathBuf, data: Vec<u8>) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::StorageWrite(format!("{} has no parent", path.display())))?;

        // Stage in a temp file and rename so a failed write never leaves a
        // partial artifact at the destination.
        let mut staged = NamedTempFile::new_in(parent)
            .map_err(|e| Error::StorageWrite(format!("{}: {}", path.display(), e)))?;
        staged
            .write_all(&data)
            .map_err(|e| Error::StorageWrite(format!("{}: {}", path.display(), e)))?;
        staged
            .persist(&path)
            .map_err(|e| Error::StorageWrite(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FsStorage {
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(tokio::fs::metadata(self.resolve(key)).await.is_ok())
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.resolve(key);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::SourceNotFound(path.display().to_string()))
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    async fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::StorageWrite(format!("{}: {}", parent.display(), e)))?;
        }

        let data = data.to_vec();
        tokio::task::spawn_blocking(move || Self::write_atomic(path, data))
            .await
            .map_err(|e| Error::StorageWrite(format!("Write task join error: {}", e)))?
    }
}

impl LocatedStore for FsStorage {
    fn location(&self) -> &Path {
        &self.root
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
