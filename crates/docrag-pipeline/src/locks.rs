//! Per-document write serialization.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Hands out one mutex per document id.
///
/// Ingestion and deletion both take the document's lock for their whole
/// critical section, so writes for one document are strictly ordered while
/// different documents proceed in parallel. Entries are never evicted; the
/// map grows by one small allocation per document ever touched, which is
/// noise next to the document's own data.
#[derive(Default)]
pub struct DocumentLocks {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl DocumentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `id`, waiting if another operation on the same
    /// document holds it.
    pub async fn acquire(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(id).or_default())
        };
        lock.lock_owned().await
    }
}
