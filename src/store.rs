//! Path-addressed blob storage for chunk artifacts and assembled files.

use crate::error::StorageError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;

/// Durable byte storage addressed by path.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Replaces the content at `path` with `data`, creating it if needed.
    async fn save(&self, path: &Path, data: &[u8]) -> Result<(), StorageError>;

    /// Appends `data` to `path`, creating it if needed.
    async fn append(&self, path: &Path, data: &[u8]) -> Result<(), StorageError>;

    /// Returns the full content of `path`.
    async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError>;

    /// Removes `path`. Missing blobs are an error.
    async fn delete(&self, path: &Path) -> Result<(), StorageError>;
}

/// [`BlobStore`] on the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct LocalBlobStore;

impl LocalBlobStore {
    pub fn new() -> Self {
        Self
    }
}

async fn ensure_parent(path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::from_io(path, e))?;
        }
    }
    Ok(())
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn save(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        ensure_parent(path).await?;
        tokio::fs::write(path, data)
            .await
            .map_err(|e| StorageError::from_io(path, e))
    }

    async fn append(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        ensure_parent(path).await?;
        let io = |e| StorageError::from_io(path, e);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(io)?;
        file.write_all(data).await.map_err(io)?;
        file.flush().await.map_err(io)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        tokio::fs::read(path)
            .await
            .map_err(|e| StorageError::from_io(path, e))
    }

    async fn delete(&self, path: &Path) -> Result<(), StorageError> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|e| StorageError::from_io(path, e))
    }
}

/// In-memory [`BlobStore`], mainly for tests.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the blob at `path`, if any.
    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.lock().get(path).cloned()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Vec<u8>>> {
        // Entries are replaced whole, so a poisoned map is still consistent.
        self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn save(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        self.lock().insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }

    async fn append(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        self.lock()
            .entry(path.to_path_buf())
            .or_default()
            .extend_from_slice(data);
        Ok(())
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        self.get(path).ok_or_else(|| StorageError::NotFound {
            path: path.to_path_buf(),
        })
    }

    async fn delete(&self, path: &Path) -> Result<(), StorageError> {
        self.lock()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound {
                path: path.to_path_buf(),
            })
    }
}
