use tandem_core::{RoomDocument, RoomId};
use tokio::sync::mpsc;
use tracing::debug;

/// Handle to a live store subscription.
///
/// Dropping the handle (or calling [`Subscription::unsubscribe`]) closes the
/// receiving side, so the store stops delivering and prunes the subscriber.
pub struct Subscription {
    room_id: RoomId,
    rx: mpsc::UnboundedReceiver<RoomDocument>,
}

impl Subscription {
    pub fn new(room_id: RoomId, rx: mpsc::UnboundedReceiver<RoomDocument>) -> Self {
        Self { room_id, rx }
    }

    /// Returns a subscription fed by the returned sender.
    pub fn channel(room_id: RoomId) -> (mpsc::UnboundedSender<RoomDocument>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(room_id, rx))
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Next snapshot, or `None` once the store side is gone or after unsubscribe.
    pub async fn next(&mut self) -> Option<RoomDocument> {
        self.rx.recv().await
    }

    pub fn unsubscribe(&mut self) {
        debug!("Unsubscribing from room {}", self.room_id);
        self.rx.close();
        while self.rx.try_recv().is_ok() {}
    }
}
