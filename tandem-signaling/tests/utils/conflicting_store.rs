use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tandem_core::{RoomDocument, RoomId};
use tandem_signaling::{MemoryStore, Revision, SessionStore, Snapshot, StoreError, Subscription};

/// Store wrapper whose next `conflicts` compare-and-set calls lose against a
/// concurrent writer. Everything else goes to the wrapped [`MemoryStore`].
///
/// # Example
///
/// ```ignore
/// let store = ConflictingStore::new(MemoryStore::new());
/// store.fail_next_writes(2);
/// ```
#[derive(Clone)]
pub struct ConflictingStore {
    inner: MemoryStore,
    conflicts: Arc<AtomicUsize>,
    cas_calls: Arc<AtomicUsize>,
}

impl ConflictingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            conflicts: Arc::new(AtomicUsize::new(0)),
            cas_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn fail_next_writes(&self, count: usize) {
        self.conflicts.store(count, Ordering::SeqCst);
    }

    pub fn cas_calls(&self) -> usize {
        self.cas_calls.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

#[async_trait]
impl SessionStore for ConflictingStore {
    async fn set(&self, room_id: &RoomId, document: RoomDocument) -> Result<Revision, StoreError> {
        self.inner.set(room_id, document).await
    }

    async fn get(&self, room_id: &RoomId) -> Result<Option<Snapshot>, StoreError> {
        self.inner.get(room_id).await
    }

    async fn compare_and_set(
        &self,
        room_id: &RoomId,
        expected: Revision,
        document: RoomDocument,
    ) -> Result<Revision, StoreError> {
        self.cas_calls.fetch_add(1, Ordering::SeqCst);
        let lost = self
            .conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if lost {
            return Err(StoreError::Conflict {
                room_id: *room_id,
                expected,
                actual: expected + 1,
            });
        }
        self.inner.compare_and_set(room_id, expected, document).await
    }

    async fn subscribe(&self, room_id: &RoomId) -> Result<Subscription, StoreError> {
        self.inner.subscribe(room_id).await
    }
}
