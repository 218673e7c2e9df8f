use crate::indexer::RevisionsIndexer;
use crate::packages::PackageLister;
use crate::paths;
use futures_util::{StreamExt, TryStreamExt};
use galleon_api_types::index::{IndexError, IndexResult};
use galleon_api_types::storage::SharedStorage;

/// How many package scans or index rebuilds run at once during a full
/// update.
const MAX_CONCURRENT_BUILDS: usize = 8;

/// Recipe index rebuild followed by a rebuild of every binary index
/// under the surviving recipe revisions.
///
/// The fan-out over `revisions x hashes` runs as a bounded parallel
/// map; the update completes only once every subtask has. Callers hold
/// the package-level lock for the whole duration, so the per-file
/// writes inside need no locks of their own.
pub struct FullIndexer {
    indexer: RevisionsIndexer,
    lister: PackageLister,
}

impl FullIndexer {
    pub fn new(storage: SharedStorage) -> Self {
        Self {
            indexer: RevisionsIndexer::new(storage.clone()),
            lister: PackageLister::new(storage),
        }
    }

    pub async fn full_update(&self, pkg: &str) -> IndexResult<()> {
        let revisions = self
            .indexer
            .build_index(pkg, &paths::RECIPE_FILES, |name, rev| {
                paths::recipe_file(pkg, rev, name)
            })
            .await?;

        let binary_dirs: Vec<Vec<String>> = futures_util::stream::iter(revisions)
            .map(|rev| {
                let dir = paths::packages_dir(pkg, rev);
                async move {
                    let hashes = self.lister.list_packages(&dir).await?;
                    Ok::<_, IndexError>(
                        hashes
                            .into_iter()
                            .map(|hash| format!("{dir}/{hash}"))
                            .collect::<Vec<_>>(),
                    )
                }
            })
            .buffer_unordered(MAX_CONCURRENT_BUILDS)
            .try_collect()
            .await?;

        futures_util::stream::iter(binary_dirs.into_iter().flatten())
            .map(|dir| async move {
                self.indexer
                    .build_index(&dir, &paths::PACKAGE_FILES, |name, rev| {
                        paths::binary_file(&dir, rev, name)
                    })
                    .await?;
                Ok::<_, IndexError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_BUILDS)
            .try_collect::<Vec<()>>()
            .await?;
        Ok(())
    }
}
