//! Revisions index subsystem of a Conan repository.
//!
//! Conan artifacts come in two kinds, recipes and binaries, and both
//! carry numbered revisions. Which revisions actually exist (with
//! every required file in place) is tracked per artifact in a small
//! JSON index file, `revisions.txt`, living next to the revision
//! subdirectories in the store. This crate owns those files: the
//! read-modify-write core, the rebuild-from-store indexers, and the
//! [`RevisionsIndexApi`] facade over one package coordinate.

use galleon_api_types::index::IndexResult;
use galleon_api_types::storage::SharedStorage;
use std::sync::Arc;

pub use batch::BatchIndexer;
pub use full::FullIndexer;
pub use indexer::RevisionsIndexer;
pub use locks::{IndexLease, IndexLocks, LEASE_DURATION};
pub use packages::PackageLister;
pub use revisions::RevisionsIndexCore;

mod batch;
mod full;
mod indexer;
mod locks;
mod packages;
pub mod paths;
mod revisions;

/// Revisions index operations for one package coordinate
/// (`name/version/user/channel`).
///
/// Mutators serialize through per-key leases; readers do not lock.
/// The whole-package operations (`update_recipe_index`,
/// `full_index_update`) hold the lease on the package prefix instead
/// of individual index files, so no two of them race for the same
/// package.
pub struct RevisionsIndexApi {
    locks: Arc<IndexLocks>,
    core: RevisionsIndexCore,
    indexer: RevisionsIndexer,
    full: FullIndexer,
    lister: PackageLister,
    pkg: String,
}

impl RevisionsIndexApi {
    pub fn new(storage: SharedStorage, pkg: impl Into<String>) -> Self {
        Self::with_locks(storage, Arc::new(IndexLocks::new()), pkg)
    }

    /// Shares a lease service across facades over the same store.
    pub fn with_locks(
        storage: SharedStorage,
        locks: Arc<IndexLocks>,
        pkg: impl Into<String>,
    ) -> Self {
        Self {
            core: RevisionsIndexCore::new(Arc::clone(&storage), Arc::clone(&locks)),
            indexer: RevisionsIndexer::new(Arc::clone(&storage)),
            full: FullIndexer::new(Arc::clone(&storage)),
            lister: PackageLister::new(storage),
            locks,
            pkg: pkg.into(),
        }
    }

    /// Rebuilds the recipe index; does not touch package binaries.
    pub async fn update_recipe_index(&self) -> IndexResult<Vec<i64>> {
        let _lease = self.locks.acquire(&self.pkg).await?;
        self.indexer
            .build_index(&self.pkg, &paths::RECIPE_FILES, |name, rev| {
                paths::recipe_file(&self.pkg, rev, name)
            })
            .await
    }

    /// Rebuilds the binary index of one `(recipe revision, hash)` pair.
    pub async fn update_binary_index(&self, recipe_rev: i64, hash: &str) -> IndexResult<Vec<i64>> {
        let dir = paths::binary_dir(&self.pkg, recipe_rev, hash);
        self.indexer
            .build_index(&dir, &paths::PACKAGE_FILES, |name, rev| {
                paths::binary_file(&dir, rev, name)
            })
            .await
    }

    /// Recipe index rebuild plus a bounded-parallel rebuild of every
    /// binary index underneath, under the package lease.
    pub async fn full_index_update(&self) -> IndexResult<()> {
        let _lease = self.locks.acquire(&self.pkg).await?;
        self.full.full_update(&self.pkg).await
    }

    pub async fn add_recipe_revision(&self, revision: i64) -> IndexResult<()> {
        self.core
            .add(revision, &paths::recipe_index(&self.pkg))
            .await
    }

    pub async fn remove_recipe_revision(&self, revision: i64) -> IndexResult<bool> {
        self.core
            .remove(revision, &paths::recipe_index(&self.pkg))
            .await
    }

    pub async fn get_recipe_revisions(&self) -> IndexResult<Vec<i64>> {
        self.core.list(&paths::recipe_index(&self.pkg)).await
    }

    pub async fn get_last_recipe_revision(&self) -> IndexResult<i64> {
        self.core.last(&paths::recipe_index(&self.pkg)).await
    }

    pub async fn add_binary_revision(
        &self,
        recipe_rev: i64,
        hash: &str,
        revision: i64,
    ) -> IndexResult<()> {
        self.core
            .add(revision, &paths::binary_index(&self.pkg, recipe_rev, hash))
            .await
    }

    pub async fn remove_binary_revision(
        &self,
        recipe_rev: i64,
        hash: &str,
        revision: i64,
    ) -> IndexResult<bool> {
        self.core
            .remove(revision, &paths::binary_index(&self.pkg, recipe_rev, hash))
            .await
    }

    pub async fn get_binary_revisions(&self, recipe_rev: i64, hash: &str) -> IndexResult<Vec<i64>> {
        self.core
            .list(&paths::binary_index(&self.pkg, recipe_rev, hash))
            .await
    }

    pub async fn get_last_binary_revision(&self, recipe_rev: i64, hash: &str) -> IndexResult<i64> {
        self.core
            .last(&paths::binary_index(&self.pkg, recipe_rev, hash))
            .await
    }

    /// Binary package hashes present under one recipe revision.
    pub async fn get_package_list(&self, recipe_rev: i64) -> IndexResult<Vec<String>> {
        self.lister
            .list_packages(&paths::packages_dir(&self.pkg, recipe_rev))
            .await
    }
}
