use crate::store::StoreError;
use std::fmt;
use std::time::Duration;
use tandem_core::RoomId;

pub type Result<T> = std::result::Result<T, SignalingError>;

/// Category of a [`SignalingError`], surfaced to the caller with the error event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MediaUnavailable,
    RoomNotFound,
    SessionAlreadyActive,
    RoomFull,
    StoreWriteConflict,
    EngineFailure,
    Timeout,
    Store,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MediaUnavailable => "media-unavailable",
            Self::RoomNotFound => "room-not-found",
            Self::SessionAlreadyActive => "session-already-active",
            Self::RoomFull => "room-full",
            Self::StoreWriteConflict => "store-write-conflict",
            Self::EngineFailure => "engine-failure",
            Self::Timeout => "timeout",
            Self::Store => "store",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SignalingError {
    /// No local stream (or a stream without tracks) where one is required.
    #[error("local media unavailable: {0}")]
    MediaUnavailable(String),

    /// Join targeted a room that does not exist or carries no offer.
    #[error("room {0} not found or has no offer")]
    RoomNotFound(RoomId),

    /// A second session was requested while one is still running.
    #[error("a room session is already active")]
    SessionAlreadyActive,

    /// The room already has a responder.
    #[error("room {0} already has two participants")]
    RoomFull(RoomId),

    /// The document kept changing under the read-merge-write, even after a retry.
    #[error("room {0} changed concurrently while merging, retry exhausted")]
    StoreWriteConflict(RoomId),

    /// The connection engine failed an operation or reported a failed connection.
    #[error("connection engine failure: {0:#}")]
    Engine(#[from] anyhow::Error),

    /// No connection was established within the configured interval.
    #[error("no connection established within {0:?}")]
    Timeout(Duration),

    #[error("session store error: {0}")]
    Store(#[source] StoreError),
}

impl SignalingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MediaUnavailable(_) => ErrorKind::MediaUnavailable,
            Self::RoomNotFound(_) => ErrorKind::RoomNotFound,
            Self::SessionAlreadyActive => ErrorKind::SessionAlreadyActive,
            Self::RoomFull(_) => ErrorKind::RoomFull,
            Self::StoreWriteConflict(_) => ErrorKind::StoreWriteConflict,
            Self::Engine(_) => ErrorKind::EngineFailure,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Store(_) => ErrorKind::Store,
        }
    }

    pub(crate) fn engine(context: impl fmt::Display) -> Self {
        Self::Engine(anyhow::anyhow!("{context}"))
    }
}

impl From<StoreError> for SignalingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { room_id, .. } => Self::StoreWriteConflict(room_id),
            other => Self::Store(other),
        }
    }
}
