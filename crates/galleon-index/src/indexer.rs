use crate::paths;
use futures_util::future::try_join_all;
use galleon_api_types::index::{IndexError, IndexResult, RevisionEntry, RevisionsRecord};
use galleon_api_types::storage::{Bytes, SharedStorage, StorageProvider};
use std::collections::BTreeSet;

/// Rebuilds one revisions index from what is actually present in the
/// store.
pub struct RevisionsIndexer {
    storage: SharedStorage,
}

impl RevisionsIndexer {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// Scans `path` for numeric revision subdirectories, keeps the
    /// revisions whose `manifest` files are all present, and writes
    /// them to `<path>/revisions.txt` with empty timestamps.
    ///
    /// `path_of` renders the probe key for one manifest file of one
    /// revision; recipe and binary layouts differ only there. Every
    /// existence probe, within a revision and across revisions, runs
    /// concurrently.
    pub async fn build_index<F>(
        &self,
        path: &str,
        manifest: &[&str],
        path_of: F,
    ) -> IndexResult<Vec<i64>>
    where
        F: Fn(&str, i64) -> String,
    {
        let keys = self.storage.list(path).await?;
        let candidates: BTreeSet<i64> = keys
            .iter()
            .map(|key| paths::revision_of(path, key))
            .filter(|rev| *rev >= 0)
            .collect();

        let checks = candidates.into_iter().map(|rev| {
            let probes: Vec<String> = manifest
                .iter()
                .copied()
                .map(|name| path_of(name, rev))
                .collect();
            async move {
                let present =
                    try_join_all(probes.iter().map(|key| self.storage.exists(key))).await?;
                Ok::<_, IndexError>((rev, present.into_iter().all(|found| found)))
            }
        });
        let verified = try_join_all(checks).await?;

        let retained: Vec<i64> = verified
            .into_iter()
            .filter(|(_, complete)| *complete)
            .map(|(rev, _)| rev)
            .collect();

        let revisions = retained
            .iter()
            .map(|rev| RevisionEntry {
                revision: rev.to_string(),
                timestamp: String::new(),
            })
            .collect();
        let record = serde_json::to_vec(&RevisionsRecord { revisions })?;
        self.storage
            .save(&format!("{path}/{}", paths::INDEX_FILE), Bytes::from(record))
            .await?;
        tracing::debug!(path, revisions = retained.len(), "index rebuilt");
        Ok(retained)
    }
}
