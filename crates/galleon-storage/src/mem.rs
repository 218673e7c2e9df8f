use async_trait::async_trait;
use galleon_api_types::storage::{Bytes, StorageError, StorageProvider, StorageResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// In-memory store, the standard fixture substrate for tests.
#[derive(Default)]
pub struct MemStorageProvider {
    blobs: RwLock<BTreeMap<String, Bytes>>,
}

#[async_trait]
impl StorageProvider for MemStorageProvider {
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let blobs = self.blobs.read();
        let keys = blobs
            .keys()
            .filter(|k| {
                prefix.is_empty()
                    || k.as_str() == prefix
                    || (k.starts_with(prefix) && k[prefix.len()..].starts_with('/'))
            })
            .cloned()
            .collect();
        Ok(keys)
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.blobs.read().contains_key(key))
    }

    async fn value(&self, key: &str) -> StorageResult<Bytes> {
        self.blobs
            .read()
            .get(key)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn save(&self, key: &str, data: Bytes) -> StorageResult<()> {
        self.blobs.write().insert(key.to_owned(), data);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.blobs.write().remove(key);
        Ok(())
    }

    async fn healthcheck(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prefix_listing_respects_separators() {
        let mem = MemStorageProvider::default();
        mem.save("zlib/1.2.11/_/_/revisions.txt", Bytes::from_static(b"a"))
            .await
            .unwrap();
        mem.save("zlib/1.2.11/_/_/0/export/conanfile.py", Bytes::from_static(b"b"))
            .await
            .unwrap();
        mem.save("zlib-ng/2.0/_/_/revisions.txt", Bytes::from_static(b"c"))
            .await
            .unwrap();

        let keys = mem.list("zlib/1.2.11/_/_").await.unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|k| k.starts_with("zlib/1.2.11/_/_/")));

        assert_eq!(mem.list("zlib").await.unwrap().len(), 2);
        assert_eq!(mem.list("").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn value_and_delete() {
        let mem = MemStorageProvider::default();
        mem.save("k", Bytes::from_static(b"v")).await.unwrap();
        assert_eq!(mem.value("k").await.unwrap().as_ref(), b"v");
        mem.delete("k").await.unwrap();
        mem.delete("k").await.unwrap();
        assert!(matches!(mem.value("k").await, Err(StorageError::NotFound)));
    }
}
