use crate::locks::IndexLocks;
use chrono::{SecondsFormat, Utc};
use galleon_api_types::index::{IndexError, IndexResult, RevisionEntry, RevisionsRecord};
use galleon_api_types::storage::{Bytes, SharedStorage, StorageProvider};
use std::sync::Arc;

/// Read-modify-write primitives for a single revisions index file.
///
/// Mutators serialize through the lease on the index file key; readers
/// go straight to the store.
pub struct RevisionsIndexCore {
    storage: SharedStorage,
    locks: Arc<IndexLocks>,
}

impl RevisionsIndexCore {
    pub fn new(storage: SharedStorage, locks: Arc<IndexLocks>) -> Self {
        Self { storage, locks }
    }

    /// Entries of the index at `path`; a missing file reads as empty.
    pub async fn load(&self, path: &str) -> IndexResult<Vec<RevisionEntry>> {
        if !self.storage.exists(path).await? {
            return Ok(Vec::new());
        }
        let bytes = self.storage.value(path).await?;
        parse_record(path, &bytes).map(|record| record.revisions)
    }

    /// Appends `revision` with a fresh timestamp, replacing any entry
    /// that already carries the same revision number.
    pub async fn add(&self, revision: i64, path: &str) -> IndexResult<()> {
        let _lease = self.locks.acquire(path).await?;
        let mut entries = self.load(path).await?;
        let rendered = revision.to_string();
        entries.retain(|e| e.revision != rendered);
        entries.push(RevisionEntry {
            revision: rendered,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        });
        self.save(path, entries).await
    }

    /// Deletes `revision` in place; `false` when the file or the entry
    /// is missing, in which case nothing is written.
    pub async fn remove(&self, revision: i64, path: &str) -> IndexResult<bool> {
        let _lease = self.locks.acquire(path).await?;
        if !self.storage.exists(path).await? {
            return Ok(false);
        }
        let mut entries = self.load(path).await?;
        let rendered = revision.to_string();
        let Some(position) = entries.iter().position(|e| e.revision == rendered) else {
            return Ok(false);
        };
        entries.remove(position);
        self.save(path, entries).await?;
        Ok(true)
    }

    /// Highest revision in the index, `-1` when the file is missing or
    /// empty.
    pub async fn last(&self, path: &str) -> IndexResult<i64> {
        Ok(self.list(path).await?.into_iter().max().unwrap_or(-1))
    }

    /// Revision numbers in array order.
    pub async fn list(&self, path: &str) -> IndexResult<Vec<i64>> {
        self.load(path)
            .await?
            .iter()
            .map(|e| parse_revision(&e.revision))
            .collect()
    }

    async fn save(&self, path: &str, revisions: Vec<RevisionEntry>) -> IndexResult<()> {
        let bytes = serde_json::to_vec(&RevisionsRecord { revisions })?;
        Ok(self.storage.save(path, Bytes::from(bytes)).await?)
    }
}

pub(crate) fn parse_record(path: &str, bytes: &[u8]) -> IndexResult<RevisionsRecord> {
    serde_json::from_slice(bytes).map_err(|_| IndexError::CorruptIndex(path.to_owned()))
}

fn parse_revision(value: &str) -> IndexResult<i64> {
    value
        .parse()
        .map_err(|_| IndexError::BadRevision(value.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locks::IndexLocks;
    use galleon_storage::mem::MemStorageProvider;

    const PATH: &str = "revisions.new";

    fn fixture() -> (SharedStorage, RevisionsIndexCore) {
        let storage: SharedStorage = Arc::new(MemStorageProvider::default());
        let core = RevisionsIndexCore::new(Arc::clone(&storage), Arc::new(IndexLocks::new()));
        (storage, core)
    }

    #[tokio::test]
    async fn missing_file_lists_empty() {
        let (_, core) = fixture();
        assert!(core.list(PATH).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_then_remove_leaves_empty() {
        let (_, core) = fixture();
        core.add(0, PATH).await.unwrap();
        assert!(core.remove(0, PATH).await.unwrap());
        assert!(core.list(PATH).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_appends_in_call_order() {
        let (_, core) = fixture();
        core.add(1, PATH).await.unwrap();
        core.add(2, PATH).await.unwrap();
        core.add(3, PATH).await.unwrap();
        assert_eq!(core.list(PATH).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(core.last(PATH).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn remove_on_missing_file_returns_false_without_writing() {
        let (storage, core) = fixture();
        assert!(!core.remove(0, PATH).await.unwrap());
        assert!(!storage.exists(PATH).await.unwrap());
    }

    #[tokio::test]
    async fn remove_of_absent_revision_returns_false() {
        let (_, core) = fixture();
        core.add(0, PATH).await.unwrap();
        assert!(core.remove(0, PATH).await.unwrap());
        assert!(!core.remove(0, PATH).await.unwrap());
    }

    #[tokio::test]
    async fn remove_reshapes_list() {
        let (_, core) = fixture();
        core.add(0, PATH).await.unwrap();
        core.add(1, PATH).await.unwrap();
        core.add(2, PATH).await.unwrap();
        assert!(core.remove(1, PATH).await.unwrap());
        assert_eq!(core.list(PATH).await.unwrap(), vec![0, 2]);
    }

    #[tokio::test]
    async fn last_of_missing_file_is_minus_one() {
        let (_, core) = fixture();
        assert_eq!(core.last(PATH).await.unwrap(), -1);
    }

    #[tokio::test]
    async fn last_is_the_numeric_maximum() {
        let (_, core) = fixture();
        core.add(1, PATH).await.unwrap();
        core.add(3, PATH).await.unwrap();
        core.add(2, PATH).await.unwrap();
        assert_eq!(core.last(PATH).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn re_add_keeps_one_entry_and_moves_it_to_the_tail() {
        let (_, core) = fixture();
        core.add(1, PATH).await.unwrap();
        core.add(2, PATH).await.unwrap();
        core.add(1, PATH).await.unwrap();
        assert_eq!(core.list(PATH).await.unwrap(), vec![2, 1]);

        let entries = core.load(PATH).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(!entries[1].timestamp.is_empty());
    }

    #[tokio::test]
    async fn corrupt_document_is_reported() {
        let (storage, core) = fixture();
        storage
            .save(PATH, Bytes::from_static(b"not json at all"))
            .await
            .unwrap();
        assert!(matches!(
            core.load(PATH).await,
            Err(IndexError::CorruptIndex(path)) if path == PATH
        ));

        storage
            .save(PATH, Bytes::from_static(br#"{"entries":[]}"#))
            .await
            .unwrap();
        assert!(matches!(
            core.load(PATH).await,
            Err(IndexError::CorruptIndex(_))
        ));
    }

    #[tokio::test]
    async fn malformed_revision_fails_listing() {
        let (storage, core) = fixture();
        storage
            .save(
                PATH,
                Bytes::from_static(br#"{"revisions":[{"revision":"abc","timestamp":""}]}"#),
            )
            .await
            .unwrap();
        assert!(matches!(
            core.list(PATH).await,
            Err(IndexError::BadRevision(value)) if value == "abc"
        ));
        assert!(core.last(PATH).await.is_err());
    }

    #[tokio::test]
    async fn saved_document_round_trips() {
        let (_, core) = fixture();
        core.add(7, PATH).await.unwrap();
        let entries = core.load(PATH).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].revision, "7");
        assert!(entries[0].timestamp.ends_with('Z'));
    }
}
