use crate::store::{Revision, SessionStore, Snapshot, StoreError, Subscription};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tandem_core::{RoomDocument, RoomId};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Default)]
struct RoomSlot {
    document: Option<RoomDocument>,
    revision: Revision,
    subscribers: Vec<mpsc::UnboundedSender<RoomDocument>>,
}

impl RoomSlot {
    fn write(&mut self, document: RoomDocument) -> Revision {
        self.revision += 1;
        self.subscribers
            .retain(|subscriber| subscriber.send(document.clone()).is_ok());
        self.document = Some(document);
        self.revision
    }
}

/// In-process [`SessionStore`]. Cloning shares the same rooms.
#[derive(Clone, Default)]
pub struct MemoryStore {
    rooms: Arc<DashMap<RoomId, RoomSlot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions on `room_id` as of the last write.
    pub fn subscriber_count(&self, room_id: &RoomId) -> usize {
        self.rooms.get(room_id).map_or(0, |slot| {
            slot.subscribers
                .iter()
                .filter(|subscriber| !subscriber.is_closed())
                .count()
        })
    }

    pub fn room_count(&self) -> usize {
        self.rooms
            .iter()
            .filter(|entry| entry.value().document.is_some())
            .count()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn set(&self, room_id: &RoomId, document: RoomDocument) -> Result<Revision, StoreError> {
        let mut slot = self.rooms.entry(*room_id).or_default();
        let revision = slot.write(document);
        debug!("Room {} written at revision {}", room_id, revision);
        Ok(revision)
    }

    async fn get(&self, room_id: &RoomId) -> Result<Option<Snapshot>, StoreError> {
        Ok(self.rooms.get(room_id).and_then(|slot| {
            slot.document.clone().map(|document| Snapshot {
                document,
                revision: slot.revision,
            })
        }))
    }

    async fn compare_and_set(
        &self,
        room_id: &RoomId,
        expected: Revision,
        document: RoomDocument,
    ) -> Result<Revision, StoreError> {
        let Some(mut slot) = self.rooms.get_mut(room_id) else {
            return Err(StoreError::Missing(*room_id));
        };
        if slot.revision != expected {
            return Err(StoreError::Conflict {
                room_id: *room_id,
                expected,
                actual: slot.revision,
            });
        }
        let revision = slot.write(document);
        debug!("Room {} merged at revision {}", room_id, revision);
        Ok(revision)
    }

    async fn subscribe(&self, room_id: &RoomId) -> Result<Subscription, StoreError> {
        let (tx, subscription) = Subscription::channel(*room_id);
        let mut slot = self.rooms.entry(*room_id).or_default();
        if let Some(current) = &slot.document {
            let _ = tx.send(current.clone());
        }
        slot.subscribers.push(tx);
        Ok(subscription)
    }
}
