use std::fmt;

/// Signaling state of a room session.
///
/// ```text
/// Idle --create--> DescriptionSent --answer seen--> RemoteDescriptionSet --connected--> Connected
/// Idle --join--> AwaitingRemoteDescription --offer applied--> RemoteDescriptionSet
/// any --failure/timeout--> Failed
/// any --close--> Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    DescriptionSent,
    AwaitingRemoteDescription,
    RemoteDescriptionSet,
    Connected,
    Failed,
    Closed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Closed)
    }

    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;

        match (self, next) {
            (Failed | Closed, _) => false,
            (_, Failed | Closed) => true,
            (Idle, DescriptionSent | AwaitingRemoteDescription) => true,
            (DescriptionSent | AwaitingRemoteDescription, RemoteDescriptionSet) => true,
            (RemoteDescriptionSet, Connected) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
