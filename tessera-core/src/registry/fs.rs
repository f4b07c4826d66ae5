//! Filesystem blob store: one `<unique_id>.png` file per master pattern.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::BlobStore;
use crate::error::{Result, TesseraError};

/// Stores master patterns as files under a root directory.
///
/// Files are created with create-new semantics, so an existing pattern is never
/// replaced. The locator recorded for each pattern is its file name.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            TesseraError::Storage(format!(
                "Cannot create pattern directory {}: {}",
                root.display(),
                e
            ))
        })?;
        tracing::info!(root = %root.display(), "Filesystem pattern store ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, reference: &str) -> Result<PathBuf> {
        let safe = !reference.is_empty()
            && reference
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !reference.starts_with('.');
        if !safe {
            return Err(TesseraError::Storage(format!(
                "Invalid pattern locator: {:?}",
                reference
            )));
        }
        Ok(self.root.join(reference))
    }
}

/// Remove a file left behind by a failed write. A failure here is logged; the
/// write error is what the caller reports.
async fn discard_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::error!(
            path = %path.display(),
            error = %e,
            "Failed to remove partial master pattern"
        );
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put_if_absent(&self, unique_id: &str, bytes: Vec<u8>) -> Result<String> {
        let reference = format!("{}.png", unique_id);
        let path = self.path_for(&reference)?;

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(TesseraError::DuplicateIdentifier(unique_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let written = async {
            file.write_all(&bytes).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            discard_partial(&path).await;
            return Err(TesseraError::Storage(format!(
                "Failed to write {}: {}",
                path.display(),
                e
            )));
        }

        tracing::debug!(path = %path.display(), size = bytes.len(), "Stored master pattern");
        Ok(reference)
    }

    async fn get(&self, reference: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(reference)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, reference: &str) -> Result<()> {
        let path = self.path_for(reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
