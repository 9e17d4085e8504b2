//! Blob storage in a single directory

use crate::error::{Result, StoreError, StoreOp};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

const TEMP_SUFFIX: &str = ".tmp";

/// Named blobs stored as `<dir>/<prefix>-<name>`.
///
/// `create` overwrites. Concurrent creates of the same name race and the last
/// rename wins; each writer uses its own temporary file, so a reader only
/// ever sees a complete blob. No in-process locking is done.
pub struct ContentStore {
    dir: PathBuf,
    prefix: String,
}

impl ContentStore {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Ensure the store directory exists and drop temporary files left
    /// behind by a process that died mid-write
    pub async fn init(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let removed = self.remove_stale_temp_files().await?;
        info!(dir = ?self.dir, prefix = %self.prefix, removed, "Content store initialized");
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the blob stored under `name`
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}-{}", self.prefix, name))
    }

    fn temp_prefix(&self) -> String {
        format!(".{}-", self.prefix)
    }

    async fn remove_stale_temp_files(&self) -> io::Result<usize> {
        let temp_prefix = self.temp_prefix();
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut removed = 0;

        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if !file_name.starts_with(&temp_prefix) || !file_name.ends_with(TEMP_SUFFIX) {
                continue;
            }
            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(file = %file_name, error = %e, "Failed to remove stale temp file"),
            }
        }

        Ok(removed)
    }

    /// Write `content` under `name`, replacing any previous blob.
    ///
    /// The write runs on the blocking pool and completes even if the caller
    /// stops waiting for it. A failed write removes its temporary file.
    pub async fn create(&self, name: &str, content: &[u8]) -> Result<()> {
        let dir = self.dir.clone();
        let target = self.path(name);
        let temp_prefix = format!("{}{}.", self.temp_prefix(), name);
        let blob_name = name.to_string();
        let content = content.to_vec();
        let size = content.len();

        tokio::task::spawn_blocking(move || {
            write_atomically(&dir, &temp_prefix, &target, &blob_name, &content)
        })
        .await
        .map_err(|e| StoreError::new(StoreOp::Write, name, io::Error::other(e)))??;

        debug!(name, size, "Stored blob");
        Ok(())
    }

    /// Read the full blob stored under `name`
    pub async fn read(&self, name: &str) -> Result<Vec<u8>> {
        let mut file = fs::File::open(self.path(name))
            .await
            .map_err(|e| StoreError::new(StoreOp::Open, name, e))?;

        let mut content = Vec::new();
        file.read_to_end(&mut content)
            .await
            .map_err(|e| StoreError::new(StoreOp::Read, name, e))?;

        Ok(content)
    }

    /// Remove the blob stored under `name`.
    ///
    /// Synchronous so it can run inside eviction handlers.
    pub fn delete(&self, name: &str) -> Result<()> {
        std::fs::remove_file(self.path(name))
            .map_err(|e| StoreError::new(StoreOp::Delete, name, e))?;
        debug!(name, "Deleted blob");
        Ok(())
    }
}

/// Temp file in `dir`, written, flushed, then renamed onto `target`
fn write_atomically(
    dir: &Path,
    temp_prefix: &str,
    target: &Path,
    name: &str,
    content: &[u8],
) -> Result<()> {
    let mut temp = tempfile::Builder::new()
        .prefix(temp_prefix)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| StoreError::new(StoreOp::Create, name, e))?;

    temp.write_all(content)
        .map_err(|e| StoreError::new(StoreOp::Write, name, e))?;

    temp.flush()
        .map_err(|e| StoreError::new(StoreOp::Close, name, e))?;

    temp.persist(target)
        .map_err(|e| StoreError::new(StoreOp::Persist, name, e.error))?;

    Ok(())
}
