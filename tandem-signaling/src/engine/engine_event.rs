use crate::media::RemoteTrack;

/// Connection state as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Events the engine produces in the background. The room session consumes
/// them on its own task, so engine callbacks never touch session state.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A local candidate was discovered; carries the JSON candidate record.
    LocalCandidate(String),

    /// The remote peer started sending a track.
    RemoteTrack(RemoteTrack),

    StateChanged(EngineState),
}
