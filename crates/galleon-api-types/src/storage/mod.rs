pub use bytes::Bytes;

use async_trait::async_trait;
use std::sync::Arc;

pub use error::{StorageError, StorageResult};

mod error;

/// Store handle shared across components.
pub type SharedStorage = Arc<dyn StorageProvider + Send + Sync>;

/// Flat key-to-blob store over hierarchical `/`-separated keys.
#[async_trait]
pub trait StorageProvider {
    /// All keys equal to `prefix` or beginning with `prefix + "/"`.
    /// The empty prefix lists the whole store. Order is unspecified.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;

    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Fails with [`StorageError::NotFound`] if the key is absent.
    async fn value(&self, key: &str) -> StorageResult<Bytes>;

    /// Creates or replaces the blob at `key`, atomically per key.
    async fn save(&self, key: &str, data: Bytes) -> StorageResult<()>;

    /// Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    async fn healthcheck(&self) -> anyhow::Result<()>;
}
