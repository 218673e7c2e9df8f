use crate::locks::IndexLocks;
use crate::paths;
use crate::RevisionsIndexApi;
use futures_util::{StreamExt, TryStreamExt};
use galleon_api_types::index::IndexResult;
use galleon_api_types::storage::{SharedStorage, StorageProvider};
use std::collections::BTreeSet;
use std::sync::Arc;

const MAX_CONCURRENT_PACKAGES: usize = 4;

/// Whole-repository reindex: finds every package coordinate with
/// recipe files in the store and rebuilds its indexes.
pub struct BatchIndexer {
    storage: SharedStorage,
    locks: Arc<IndexLocks>,
}

impl BatchIndexer {
    pub fn new(storage: SharedStorage) -> Self {
        Self {
            storage,
            locks: Arc::new(IndexLocks::new()),
        }
    }

    /// Returns the package coordinates that were updated.
    pub async fn update_all(&self) -> IndexResult<Vec<String>> {
        let keys = self.storage.list("").await?;
        let packages: Vec<String> = recipe_prefixes(&keys).into_iter().collect();

        futures_util::stream::iter(packages.iter())
            .map(|pkg| {
                let api = RevisionsIndexApi::with_locks(
                    Arc::clone(&self.storage),
                    Arc::clone(&self.locks),
                    pkg.clone(),
                );
                async move {
                    tracing::debug!(package = %pkg, "rebuilding package indexes");
                    api.full_index_update().await
                }
            })
            .buffer_unordered(MAX_CONCURRENT_PACKAGES)
            .try_collect::<Vec<()>>()
            .await?;
        Ok(packages)
    }
}

/// Key prefixes that look like package coordinates: everything above a
/// `<int>/export/` subtree.
fn recipe_prefixes(keys: &[String]) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for key in keys {
        let segments: Vec<&str> = key.split('/').collect();
        for i in 1..segments.len().saturating_sub(1) {
            if segments[i + 1] == paths::RECIPE_SUBDIR && segments[i].parse::<u64>().is_ok() {
                out.insert(segments[..i].join("/"));
                break;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use galleon_api_types::storage::Bytes;
    use galleon_storage::mem::MemStorageProvider;

    #[tokio::test]
    async fn updates_every_discovered_package() {
        let storage: SharedStorage = Arc::new(MemStorageProvider::default());
        for pkg in ["zlib/1.2.11/_/_", "boost/1.80.0/corp/stable"] {
            for name in paths::RECIPE_FILES {
                storage
                    .save(&paths::recipe_file(pkg, 0, name), Bytes::from_static(b"x"))
                    .await
                    .unwrap();
            }
        }
        storage
            .save("loose-file.txt", Bytes::from_static(b"x"))
            .await
            .unwrap();

        let updated = BatchIndexer::new(Arc::clone(&storage))
            .update_all()
            .await
            .unwrap();
        assert_eq!(updated, vec!["boost/1.80.0/corp/stable", "zlib/1.2.11/_/_"]);
        for pkg in &updated {
            assert!(storage.exists(&paths::recipe_index(pkg)).await.unwrap());
        }
    }

    #[test]
    fn prefix_derivation_needs_a_numeric_revision_dir() {
        let keys = vec![
            "zlib/1.2.11/_/_/0/export/conanfile.py".to_owned(),
            "zlib/1.2.11/_/_/0/package/aaaa/0/conaninfo.txt".to_owned(),
            "notes/export/readme.txt".to_owned(),
        ];
        let prefixes = recipe_prefixes(&keys);
        assert_eq!(
            prefixes.into_iter().collect::<Vec<_>>(),
            vec!["zlib/1.2.11/_/_"]
        );
    }
}
