use crate::store::Subscription;
use async_trait::async_trait;
use tandem_core::{RoomDocument, RoomId};

/// Monotonic per-room write counter, bumped by every successful write.
pub type Revision = u64;

/// A document as read from the store, with the revision it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub document: RoomDocument,
    pub revision: Revision,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("room {room_id} is at revision {actual}, expected {expected}")]
    Conflict {
        room_id: RoomId,
        expected: Revision,
        actual: Revision,
    },

    #[error("room {0} does not exist")]
    Missing(RoomId),

    #[error("store backend unavailable: {0}")]
    Backend(String),
}

/// Shared document store the two peers signal through.
///
/// Implementations must deliver the latest snapshot to every live
/// [`Subscription`] after each successful write, at least once.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Unconditionally replaces the document of `room_id`.
    async fn set(&self, room_id: &RoomId, document: RoomDocument) -> Result<Revision, StoreError>;

    async fn get(&self, room_id: &RoomId) -> Result<Option<Snapshot>, StoreError>;

    /// Replaces the document only if the room is still at `expected`.
    async fn compare_and_set(
        &self,
        room_id: &RoomId,
        expected: Revision,
        document: RoomDocument,
    ) -> Result<Revision, StoreError>;

    async fn subscribe(&self, room_id: &RoomId) -> Result<Subscription, StoreError>;
}
