use crate::room::{RoomCommand, RoomSession, SessionState};
use tandem_core::{Role, RoomId};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Handle to a room session running on its own task.
pub struct RoomHandle {
    room_id: RoomId,
    role: Role,
    command_tx: mpsc::Sender<RoomCommand>,
    task: JoinHandle<()>,
}

impl RoomHandle {
    /// Moves a created/joined session onto its event loop task.
    pub fn spawn(session: RoomSession) -> Option<Self> {
        let room_id = session.room_id()?;
        let role = session.role()?;
        let (command_tx, command_rx) = mpsc::channel(16);
        let task = tokio::spawn(session.run(command_rx));

        Some(Self {
            room_id,
            role,
            command_tx,
            task,
        })
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// `true` once the event loop ended (failed, timed out or closed).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Current state, or `None` if the event loop already ended.
    pub async fn state(&self) -> Option<SessionState> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(RoomCommand::State { reply })
            .await
            .ok()?;
        rx.await.ok()
    }

    /// Closes the session and waits for its event loop to finish.
    pub async fn close(self) {
        let (done, rx) = oneshot::channel();
        if self.command_tx.send(RoomCommand::Close { done }).await.is_ok() {
            let _ = rx.await;
        } else {
            debug!("Room {} event loop already finished", self.room_id);
        }

        if let Err(e) = self.task.await {
            warn!("Room {} event loop ended abnormally: {:?}", self.room_id, e);
        }
    }
}
