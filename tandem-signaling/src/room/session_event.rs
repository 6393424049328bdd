use crate::error::ErrorKind;
use crate::media::RemoteTrack;
use crate::room::SessionState;

/// Events surfaced to the caller.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    RemoteStreamAvailable(RemoteTrack),
    ConnectionStateChanged(SessionState),
    Error { kind: ErrorKind, detail: String },
}
