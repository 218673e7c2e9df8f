use crate::paths;
use galleon_api_types::index::IndexResult;
use galleon_api_types::storage::{SharedStorage, StorageProvider};
use std::collections::BTreeSet;

/// Lists the binary packages (hash subdirectories) of a Conan package.
pub struct PackageLister {
    storage: SharedStorage,
}

impl PackageLister {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// Direct subdirectory names under `prefix`, deduplicated.
    pub async fn list_packages(&self, prefix: &str) -> IndexResult<Vec<String>> {
        let keys = self.storage.list(prefix).await?;
        let hashes: BTreeSet<String> = keys
            .iter()
            .map(|key| paths::next_segment(prefix, key))
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .collect();
        Ok(hashes.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galleon_api_types::storage::Bytes;
    use galleon_storage::mem::MemStorageProvider;
    use std::sync::Arc;

    #[tokio::test]
    async fn lists_hash_subdirs_once() {
        let storage: SharedStorage = Arc::new(MemStorageProvider::default());
        let prefix = "zlib/1.2.11/_/_/0/package";
        for key in [
            format!("{prefix}/aaaa/0/conaninfo.txt"),
            format!("{prefix}/aaaa/0/conanmanifest.txt"),
            format!("{prefix}/bbbb/0/conaninfo.txt"),
            format!("{prefix}/revisions.txt"),
        ] {
            storage.save(&key, Bytes::from_static(b"x")).await.unwrap();
        }

        let lister = PackageLister::new(storage);
        assert_eq!(lister.list_packages(prefix).await.unwrap(), vec!["aaaa", "bbbb"]);
    }

    #[tokio::test]
    async fn empty_prefix_listing_is_empty() {
        let storage: SharedStorage = Arc::new(MemStorageProvider::default());
        let lister = PackageLister::new(storage);
        assert!(lister
            .list_packages("zlib/1.2.11/_/_/0/package")
            .await
            .unwrap()
            .is_empty());
    }
}
