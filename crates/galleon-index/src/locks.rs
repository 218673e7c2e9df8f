use galleon_api_types::index::{IndexError, IndexResult};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::timeout;

/// Lease lifetime for a single index operation.
pub const LEASE_DURATION: Duration = Duration::from_secs(60 * 60);

type LockRegistry = Arc<Mutex<HashMap<String, Weak<LockCell>>>>;

/// Storage key -> lease gate for index mutations.
///
/// Leases release when the [`IndexLease`] drops, so an operation that
/// fails still frees its key immediately. A lease leaked by an
/// abandoned task holds the key until its deadline; waiters observe
/// the deadline and give up with `LockUnavailable` once it lapses,
/// rather than stealing the gate.
///
/// A strong `Arc` on the cell is held by the current holder and any
/// waiters, which makes it easy to clean the registry up after the
/// last user of each key.
pub struct IndexLocks {
    locks: LockRegistry,
}

struct LockCell {
    gate: Arc<AsyncMutex<()>>,
    deadline: Mutex<Option<Instant>>,
}

impl IndexLocks {
    pub fn new() -> Self {
        Self {
            locks: Arc::default(),
        }
    }

    /// Waits until the lease on `key` is granted, giving up once the
    /// incumbent lease's expiration passes without a release.
    pub async fn acquire(&self, key: &str) -> IndexResult<IndexLease> {
        let cell = self.cell_for_key(key);
        let guard = match Arc::clone(&cell.gate).try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                let wait = cell
                    .deadline
                    .lock()
                    .unwrap()
                    .map_or(LEASE_DURATION, |d| {
                        d.saturating_duration_since(Instant::now())
                    });
                timeout(wait, Arc::clone(&cell.gate).lock_owned())
                    .await
                    .map_err(|_| IndexError::LockUnavailable(key.to_owned()))?
            }
        };
        *cell.deadline.lock().unwrap() = Some(Instant::now() + LEASE_DURATION);
        Ok(IndexLease {
            guard: Some(guard),
            cell: Some(cell),
            key: key.to_owned(),
            registry: Arc::clone(&self.locks),
        })
    }

    fn cell_for_key(&self, key: &str) -> Arc<LockCell> {
        match self.locks.lock().unwrap().entry(key.to_owned()) {
            Entry::Occupied(mut e) => {
                if let Some(existing) = e.get().upgrade() {
                    existing
                } else {
                    let new_cell = new_cell();
                    *e.get_mut() = Arc::downgrade(&new_cell);
                    new_cell
                }
            }
            Entry::Vacant(e) => {
                let new_cell = new_cell();
                e.insert(Arc::downgrade(&new_cell));
                new_cell
            }
        }
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.locks.lock().unwrap().len()
    }
}

impl Default for IndexLocks {
    fn default() -> Self {
        Self::new()
    }
}

fn new_cell() -> Arc<LockCell> {
    Arc::new(LockCell {
        gate: Arc::new(AsyncMutex::new(())),
        deadline: Mutex::new(None),
    })
}

/// Held lease on one storage key; releasing is dropping.
pub struct IndexLease {
    guard: Option<OwnedMutexGuard<()>>,
    cell: Option<Arc<LockCell>>,
    key: String,
    registry: LockRegistry,
}

impl Drop for IndexLease {
    fn drop(&mut self) {
        if let Some(cell) = self.cell.take() {
            *cell.deadline.lock().unwrap() = None;
        }
        // release the gate before the registry cleanup runs
        let _ = self.guard.take();

        // Can drop the entry in the shared hashtable after the last user is dropped
        let mut locks = self.registry.lock().unwrap();
        if let Some(entry) = locks.get_mut(&self.key) {
            if Weak::strong_count(entry) == 0 {
                locks.remove(&self.key);
            }
        }
    }
}
