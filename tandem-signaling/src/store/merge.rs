use crate::error::{Result, SignalingError};
use crate::store::{Revision, SessionStore, StoreError};
use tandem_core::{RoomDocument, RoomId};
use tracing::{debug, warn};

/// Initial attempt plus one retry after a conflicting concurrent write.
pub const MERGE_ATTEMPTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Written(Revision),
    /// The mutation found nothing to change; no write was issued.
    Unchanged,
}

/// Optimistic read-merge-write of a room document.
///
/// Reads the latest snapshot, applies `mutate` to a copy and writes it back
/// with compare-and-set against the revision that was read. `mutate` returns
/// whether it changed anything. A conflict re-reads and retries once before
/// surfacing [`SignalingError::StoreWriteConflict`].
pub async fn merge_document<F>(
    store: &dyn SessionStore,
    room_id: &RoomId,
    mut mutate: F,
) -> Result<MergeOutcome>
where
    F: FnMut(&mut RoomDocument) -> bool,
{
    for attempt in 1..=MERGE_ATTEMPTS {
        let Some(snapshot) = store.get(room_id).await? else {
            return Err(SignalingError::RoomNotFound(*room_id));
        };

        let mut document = snapshot.document;
        if !mutate(&mut document) {
            return Ok(MergeOutcome::Unchanged);
        }

        match store
            .compare_and_set(room_id, snapshot.revision, document)
            .await
        {
            Ok(revision) => {
                debug!(
                    "Merged room {} at revision {} (attempt {})",
                    room_id, revision, attempt
                );
                return Ok(MergeOutcome::Written(revision));
            }
            Err(StoreError::Conflict {
                expected, actual, ..
            }) => {
                warn!(
                    "Room {} moved from revision {} to {} during merge (attempt {})",
                    room_id, expected, actual, attempt
                );
            }
            Err(StoreError::Missing(_)) => return Err(SignalingError::RoomNotFound(*room_id)),
            Err(e) => return Err(e.into()),
        }
    }

    Err(SignalingError::StoreWriteConflict(*room_id))
}
