use crate::config::SessionConfig;
use crate::engine::{EngineFactory, WebRtcEngineFactory};
use crate::error::{Result, SignalingError};
use crate::media::{LocalMedia, MediaConstraints, MediaSource};
use crate::room::{RoomHandle, RoomSession, SessionEvent, SessionState};
use crate::store::SessionStore;
use std::sync::Arc;
use tandem_core::RoomId;
use tokio::sync::{Mutex, mpsc};
use tracing::{info, warn};

struct ActiveSession {
    handle: RoomHandle,
    media: LocalMedia,
}

/// Entry point for the caller: creates or joins one room at a time and
/// forwards session events to the receiver returned by [`SignalingCoordinator::new`].
pub struct SignalingCoordinator {
    store: Arc<dyn SessionStore>,
    engines: Arc<dyn EngineFactory>,
    media: Arc<dyn MediaSource>,
    config: SessionConfig,
    events_tx: mpsc::Sender<SessionEvent>,
    active: Mutex<Option<ActiveSession>>,
}

impl SignalingCoordinator {
    pub fn new(
        store: Arc<dyn SessionStore>,
        engines: Arc<dyn EngineFactory>,
        media: Arc<dyn MediaSource>,
        config: SessionConfig,
    ) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (events_tx, events_rx) = mpsc::channel(config.event_capacity.max(1));
        let coordinator = Self {
            store,
            engines,
            media,
            config,
            events_tx,
            active: Mutex::new(None),
        };
        (coordinator, events_rx)
    }

    /// Coordinator using real `webrtc` peer connections.
    pub fn webrtc(
        store: Arc<dyn SessionStore>,
        media: Arc<dyn MediaSource>,
        config: SessionConfig,
    ) -> (Self, mpsc::Receiver<SessionEvent>) {
        Self::new(store, Arc::new(WebRtcEngineFactory), media, config)
    }

    pub async fn create_room(&self, constraints: &MediaConstraints) -> Result<RoomId> {
        let mut active = self.active.lock().await;
        Self::ensure_vacant(&mut active).await?;

        let media = self.open_media(constraints).await?;
        let mut session = self.new_session();
        let room_id = session.create_room(&media).await?;

        *active = Some(self.start(session, media)?);
        info!("Room {} created, share its id with the other participant", room_id);
        Ok(room_id)
    }

    pub async fn join_room(&self, room_id: RoomId, constraints: &MediaConstraints) -> Result<()> {
        let mut active = self.active.lock().await;
        Self::ensure_vacant(&mut active).await?;

        let media = self.open_media(constraints).await?;
        let mut session = self.new_session();
        session.join_room(room_id, &media).await?;

        *active = Some(self.start(session, media)?);
        info!("Joined room {}", room_id);
        Ok(())
    }

    /// Closes the active session, if any.
    pub async fn leave_room(&self) {
        let Some(session) = self.active.lock().await.take() else {
            return;
        };
        info!("Leaving room {}", session.handle.room_id());
        session.handle.close().await;
    }

    /// Room of the active session, if one is still running.
    pub async fn active_room(&self) -> Option<RoomId> {
        self.active
            .lock()
            .await
            .as_ref()
            .filter(|session| !session.handle.is_finished())
            .map(|session| session.handle.room_id())
    }

    pub async fn session_state(&self) -> Option<SessionState> {
        let active = self.active.lock().await;
        active.as_ref()?.handle.state().await
    }

    /// The local stream of the active session, for feeding samples into its tracks.
    pub async fn local_media(&self) -> Option<LocalMedia> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|session| session.media.clone())
    }

    /// A finished session (failed or timed out) no longer occupies the slot.
    async fn ensure_vacant(active: &mut Option<ActiveSession>) -> Result<()> {
        let finished = match active.as_ref() {
            Some(session) => session.handle.is_finished(),
            None => return Ok(()),
        };
        if !finished {
            return Err(SignalingError::SessionAlreadyActive);
        }

        if let Some(stale) = active.take() {
            stale.handle.close().await;
        }
        Ok(())
    }

    async fn open_media(&self, constraints: &MediaConstraints) -> Result<LocalMedia> {
        let media = self
            .media
            .open(constraints)
            .await
            .map_err(|e| SignalingError::MediaUnavailable(format!("{e:#}")))?;
        if media.is_empty() {
            warn!("Media source returned no tracks for {:?}", constraints);
        }
        Ok(media)
    }

    fn new_session(&self) -> RoomSession {
        RoomSession::new(
            self.store.clone(),
            self.engines.clone(),
            self.config.clone(),
            self.events_tx.clone(),
        )
    }

    fn start(&self, session: RoomSession, media: LocalMedia) -> Result<ActiveSession> {
        let handle = RoomHandle::spawn(session)
            .ok_or_else(|| SignalingError::engine("session has no room after setup"))?;
        Ok(ActiveSession { handle, media })
    }
}
