//! Per-wallet scoped file storage.
//!
//! Each wallet owns a small folder of text files. The only file the core
//! writes is the enabled-token list; everything else in the folder belongs
//! to the engine.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors that can occur while reading or writing wallet files.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The file has never been written
    #[error("file not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text file access scoped to one wallet.
#[async_trait]
pub trait WalletFolder: Send + Sync {
    async fn get_text(&self, name: &str) -> Result<String, StorageError>;

    async fn set_text(&self, name: &str, text: &str) -> Result<(), StorageError>;
}

/// Folder backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct FsFolder {
    root: PathBuf,
}

impl FsFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl WalletFolder for FsFolder {
    async fn get_text(&self, name: &str) -> Result<String, StorageError> {
        let path = self.root.join(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set_text(&self, name: &str, text: &str) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(name);

        // Write atomically: write to temp file, then rename
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, text).await?;
        tokio::fs::rename(&temp_path, &path).await?;
        Ok(())
    }
}

/// Folder kept in memory; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryFolder {
    files: RwLock<HashMap<String, String>>,
}

impl MemoryFolder {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletFolder for MemoryFolder {
    async fn get_text(&self, name: &str) -> Result<String, StorageError> {
        self.files
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    async fn set_text(&self, name: &str, text: &str) -> Result<(), StorageError> {
        self.files
            .write()
            .await
            .insert(name.to_string(), text.to_string());
        Ok(())
    }
}
