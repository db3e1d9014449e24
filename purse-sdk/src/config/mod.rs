//! Configuration types for the purse wallet core.
//!
//! These types represent the validated runtime configuration and can be
//! shared across crates. Loading and parsing config files is handled by
//! the CLI crate.

mod request;
mod send;
mod storage;

pub use request::RequestConfig;
pub use send::SendConfig;
pub use storage::StorageConfig;

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared configuration state with separate locks for each section.
///
/// This allows independent access to different configuration sections
/// without blocking other readers/writers.
#[derive(Clone)]
pub struct SharedConfig {
    /// Send flow configuration (timeouts, notification texts).
    pub send: Arc<RwLock<SendConfig>>,
    /// Request screen configuration (conversion rate, precision).
    pub request: Arc<RwLock<RequestConfig>>,
    /// Per-wallet storage location.
    pub storage: Arc<RwLock<StorageConfig>>,
}

impl SharedConfig {
    /// Create a new SharedConfig from individual configuration parts.
    pub fn new(send: SendConfig, request: RequestConfig, storage: StorageConfig) -> Self {
        Self {
            send: Arc::new(RwLock::new(send)),
            request: Arc::new(RwLock::new(request)),
            storage: Arc::new(RwLock::new(storage)),
        }
    }

    /// Get a read lock on the send configuration.
    pub async fn send(&self) -> tokio::sync::RwLockReadGuard<'_, SendConfig> {
        self.send.read().await
    }

    /// Get a read lock on the request configuration.
    pub async fn request(&self) -> tokio::sync::RwLockReadGuard<'_, RequestConfig> {
        self.request.read().await
    }

    /// Get a read lock on the storage configuration.
    pub async fn storage(&self) -> tokio::sync::RwLockReadGuard<'_, StorageConfig> {
        self.storage.read().await
    }
}
