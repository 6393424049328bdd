use crate::room::SessionState;
use tokio::sync::oneshot;

/// Commands sent to a running room session.
#[derive(Debug)]
pub enum RoomCommand {
    /// Tear the session down; `done` fires once resources are released.
    Close { done: oneshot::Sender<()> },

    /// Report the current signaling state.
    State { reply: oneshot::Sender<SessionState> },
}
