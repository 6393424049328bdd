use std::sync::Arc;
use std::time::Duration;

use tandem_core::{Role, RoomDocument, RoomId, SessionDescription};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

// Internal imports
use crate::config::SessionConfig;
use crate::engine::{ConnectionEngine, EngineEvent, EngineFactory, EngineState};
use crate::error::{Result, SignalingError};
use crate::media::LocalMedia;
use crate::room::{CandidateQueue, Disposition, RoomCommand, SessionEvent, SessionState};
use crate::store::{MergeOutcome, SessionStore, Subscription, merge_document};

/// Signaling state machine for one participant of one room.
///
/// Drives offer/answer and trickled candidate exchange through the shared
/// store. Every input (store notification, engine event, command) is handled
/// by `&mut self`, and once created or joined the session is moved onto a
/// single task by [`RoomSession::run`], so all handling is serialized.
pub struct RoomSession {
    store: Arc<dyn SessionStore>,
    engines: Arc<dyn EngineFactory>,
    config: SessionConfig,

    state: SessionState,
    /// Cleared before teardown releases anything; inputs are ignored afterwards.
    active: bool,
    room_id: Option<RoomId>,
    role: Option<Role>,

    engine: Option<Box<dyn ConnectionEngine>>,
    engine_tx: mpsc::Sender<EngineEvent>,
    engine_rx: mpsc::Receiver<EngineEvent>,

    subscription: Option<Subscription>,
    candidates: CandidateQueue,
    local_description: Option<SessionDescription>,
    remote_description: Option<SessionDescription>,
    deadline: Option<Instant>,

    events: mpsc::Sender<SessionEvent>,
}

impl RoomSession {
    pub fn new(
        store: Arc<dyn SessionStore>,
        engines: Arc<dyn EngineFactory>,
        config: SessionConfig,
        events: mpsc::Sender<SessionEvent>,
    ) -> Self {
        let (engine_tx, engine_rx) = mpsc::channel(config.event_capacity.max(1));

        Self {
            store,
            engines,
            config,
            state: SessionState::Idle,
            active: false,
            room_id: None,
            role: None,
            engine: None,
            engine_tx,
            engine_rx,
            subscription: None,
            candidates: CandidateQueue::new(),
            local_description: None,
            remote_description: None,
            deadline: None,
            events,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn room_id(&self) -> Option<RoomId> {
        self.room_id
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn local_description(&self) -> Option<&SessionDescription> {
        self.local_description.as_ref()
    }

    /// The description applied as remote, exactly as read from the store.
    pub fn remote_description(&self) -> Option<&SessionDescription> {
        self.remote_description.as_ref()
    }

    pub fn pending_candidates(&self) -> usize {
        self.candidates.pending_len()
    }

    pub fn applied_candidates(&self) -> usize {
        self.candidates.applied_count()
    }

    /// Opens a new room as initiator and posts the offer.
    pub async fn create_room(&mut self, media: &LocalMedia) -> Result<RoomId> {
        self.ensure_idle()?;
        if media.is_empty() {
            return Err(SignalingError::MediaUnavailable(
                "no local stream attached".to_owned(),
            ));
        }

        let room_id = RoomId::new();
        info!("Creating room {}", room_id);
        self.open(room_id, Role::Initiator, media).await?;

        if let Err(e) = self.publish_offer(room_id).await {
            error!("Failed to create room {}: {}", room_id, e);
            self.teardown(SessionState::Failed).await;
            return Err(e);
        }

        Ok(room_id)
    }

    /// Joins an existing room as responder and posts the answer.
    pub async fn join_room(&mut self, room_id: RoomId, media: &LocalMedia) -> Result<()> {
        self.ensure_idle()?;
        if media.is_empty() {
            return Err(SignalingError::MediaUnavailable(
                "no local stream attached".to_owned(),
            ));
        }

        let snapshot = self.store.get(&room_id).await?;
        let Some(document) = snapshot.map(|s| s.document) else {
            return Err(SignalingError::RoomNotFound(room_id));
        };
        let Some(offer) = document.offer else {
            return Err(SignalingError::RoomNotFound(room_id));
        };
        if document.answer.is_some() {
            return Err(SignalingError::RoomFull(room_id));
        }

        info!("Joining room {}", room_id);
        self.open(room_id, Role::Responder, media).await?;
        self.transition(SessionState::AwaitingRemoteDescription).await;

        if let Err(e) = self.answer_offer(room_id, offer).await {
            error!("Failed to join room {}: {}", room_id, e);
            self.teardown(SessionState::Failed).await;
            return Err(e);
        }

        Ok(())
    }

    /// Releases the subscription and the engine. Safe to call in any state, any number of times.
    pub async fn close(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        info!("Closing session in room {:?}", self.room_id);
        self.teardown(SessionState::Closed).await;
    }

    /// Event loop: serializes store notifications, engine events, commands and the timeout.
    pub async fn run(mut self, mut commands: mpsc::Receiver<RoomCommand>) {
        info!("Room session event loop started for {:?}", self.room_id);

        while !self.state.is_terminal() {
            let deadline = self.deadline;

            tokio::select! {
                cmd = commands.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("Command channel closed. Shutting down session.");
                            self.close().await;
                        }
                    }
                }

                doc = next_document(&mut self.subscription) => {
                    match doc {
                        Some(d) => self.handle_store_change(d).await,
                        None => {
                            warn!("Store subscription for {:?} ended", self.room_id);
                            self.subscription = None;
                        }
                    }
                }

                evt = self.engine_rx.recv() => {
                    if let Some(e) = evt {
                        self.handle_engine_event(e).await;
                    }
                }

                _ = sleep_until(deadline) => self.handle_timeout().await,
            }
        }

        // Answer commands that raced with teardown.
        commands.close();
        while let Ok(cmd) = commands.try_recv() {
            self.handle_command(cmd).await;
        }

        info!("Room session event loop finished in state {}", self.state);
    }

    /// Applies a store snapshot: the answer (initiator side, once) and any
    /// counterpart candidates not seen before.
    pub async fn handle_store_change(&mut self, document: RoomDocument) {
        if !self.active {
            debug!("Ignoring store change for inactive session");
            return;
        }
        let Some(role) = self.role else {
            return;
        };

        if role == Role::Initiator {
            match (self.remote_description.clone(), document.answer.clone()) {
                (None, Some(answer)) => {
                    self.apply_answer(answer).await;
                    if !self.active {
                        return;
                    }
                }
                (Some(applied), Some(answer)) if applied != answer => {
                    warn!("Ignoring a second, different answer in room {:?}", self.room_id);
                }
                _ => {}
            }
        }

        let Some(engine) = self.engine.as_deref() else {
            return;
        };
        let can_apply_now = self.remote_description.is_some();
        for candidate in document.candidates_from(role.counterpart()) {
            let disposition = self
                .candidates
                .enqueue_or_apply(candidate, can_apply_now, engine)
                .await;
            if disposition == Disposition::Applied {
                debug!("Applied {} candidate", role.counterpart());
            }
        }
    }

    pub async fn handle_engine_event(&mut self, event: EngineEvent) {
        if !self.active {
            debug!("Ignoring engine event for inactive session: {:?}", event);
            return;
        }

        match event {
            EngineEvent::LocalCandidate(payload) => self.publish_candidate(payload).await,

            EngineEvent::RemoteTrack(track) => {
                info!("Remote stream available: {:?}", track);
                self.emit(SessionEvent::RemoteStreamAvailable(track)).await;
            }

            EngineEvent::StateChanged(EngineState::Connected) => {
                if self.state.can_transition_to(SessionState::Connected) {
                    self.deadline = None;
                    self.transition(SessionState::Connected).await;
                } else {
                    warn!("Engine connected while session is {}", self.state);
                }
            }

            EngineEvent::StateChanged(
                state @ (EngineState::Failed | EngineState::Disconnected | EngineState::Closed),
            ) => {
                self.fail(SignalingError::engine(format!(
                    "peer connection reported {:?}",
                    state
                )))
                .await;
            }

            EngineEvent::StateChanged(state) => {
                debug!("Engine state {:?} in session {}", state, self.state);
            }
        }
    }

    async fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Close { done } => {
                self.close().await;
                let _ = done.send(());
            }
            RoomCommand::State { reply } => {
                let _ = reply.send(self.state);
            }
        }
    }

    async fn handle_timeout(&mut self) {
        let waited = self.config.connect_timeout.unwrap_or(Duration::ZERO);
        warn!(
            "No connection in room {:?} after {:?} (state {})",
            self.room_id, waited, self.state
        );
        self.fail(SignalingError::Timeout(waited)).await;
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.state == SessionState::Idle {
            Ok(())
        } else {
            Err(SignalingError::SessionAlreadyActive)
        }
    }

    /// Creates the engine for `role` and attaches the local tracks.
    async fn open(&mut self, room_id: RoomId, role: Role, media: &LocalMedia) -> Result<()> {
        let engine = self
            .engines
            .create(role, &self.config.engine, self.engine_tx.clone())
            .await?;

        for track in media.tracks() {
            if let Err(e) = engine.add_local_track(track.clone()).await {
                let _ = engine.close().await;
                return Err(e.into());
            }
        }

        self.engine = Some(engine);
        self.room_id = Some(room_id);
        self.role = Some(role);
        self.active = true;
        Ok(())
    }

    fn engine(&self) -> Result<&dyn ConnectionEngine> {
        self.engine
            .as_deref()
            .ok_or_else(|| SignalingError::engine("engine already released"))
    }

    async fn publish_offer(&mut self, room_id: RoomId) -> Result<()> {
        // 1. Offer becomes the local description
        let engine = self.engine()?;
        let offer = engine.create_offer().await?;
        engine.set_local_description(&offer).await?;

        // 2. Room document with only the offer, then watch it for the answer
        self.store
            .set(&room_id, RoomDocument::with_offer(offer.clone()))
            .await?;
        self.subscription = Some(self.store.subscribe(&room_id).await?);
        self.local_description = Some(offer);

        self.transition(SessionState::DescriptionSent).await;
        self.arm_deadline();
        Ok(())
    }

    async fn answer_offer(&mut self, room_id: RoomId, offer: SessionDescription) -> Result<()> {
        // 1. Stored offer as remote description, answer as local
        let engine = self.engine()?;
        engine.set_remote_description(&offer).await?;
        let answer = engine.create_answer().await?;
        engine.set_local_description(&answer).await?;
        self.remote_description = Some(offer);

        // 2. Merge the answer in, keeping offer and candidates already posted
        let mut taken = false;
        merge_document(self.store.as_ref(), &room_id, |doc| {
            taken = doc.answer.as_ref().is_some_and(|a| a != &answer);
            if taken || doc.answer.is_some() {
                return false;
            }
            doc.answer = Some(answer.clone());
            true
        })
        .await?;
        if taken {
            return Err(SignalingError::RoomFull(room_id));
        }
        self.local_description = Some(answer);

        // 3. Watch the room for initiator candidates
        self.transition(SessionState::RemoteDescriptionSet).await;
        self.subscription = Some(self.store.subscribe(&room_id).await?);
        self.arm_deadline();
        Ok(())
    }

    async fn apply_answer(&mut self, answer: SessionDescription) {
        let Some(engine) = self.engine.as_deref() else {
            return;
        };

        if let Err(e) = engine.set_remote_description(&answer).await {
            self.fail(e.context("Failed to apply remote answer").into())
                .await;
            return;
        }
        self.remote_description = Some(answer);
        info!("Remote answer applied in room {:?}", self.room_id);

        let flushed = self.candidates.flush(engine).await;
        if flushed > 0 {
            debug!("Flushed {} buffered candidate(s)", flushed);
        }
        self.transition(SessionState::RemoteDescriptionSet).await;
    }

    /// Appends a local candidate to this role's list with the optimistic merge.
    async fn publish_candidate(&mut self, payload: String) {
        let (Some(room_id), Some(role)) = (self.room_id, self.role) else {
            return;
        };

        let result = merge_document(self.store.as_ref(), &room_id, |doc| {
            doc.push_candidate(role, &payload)
        })
        .await;

        match result {
            Ok(MergeOutcome::Written(revision)) => {
                debug!("Posted {} candidate at revision {}", role, revision);
            }
            Ok(MergeOutcome::Unchanged) => {
                debug!("{} candidate already posted", role);
            }
            Err(e) => {
                error!("Failed to post {} candidate: {}", role, e);
                self.emit_error(&e).await;
            }
        }
    }

    async fn fail(&mut self, err: SignalingError) {
        error!("Session in room {:?} failed: {}", self.room_id, err);
        self.emit_error(&err).await;
        self.teardown(SessionState::Failed).await;
    }

    /// Marks the session inactive first, then unsubscribes and releases the engine.
    async fn teardown(&mut self, terminal: SessionState) {
        self.active = false;
        self.deadline = None;

        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.candidates.clear();

        if let Some(engine) = self.engine.take() {
            if let Err(e) = engine.close().await {
                warn!("Engine close failed: {:#}", e);
            }
        }
        while self.engine_rx.try_recv().is_ok() {}

        self.transition(terminal).await;
    }

    async fn transition(&mut self, next: SessionState) {
        if !self.state.can_transition_to(next) {
            debug!("Skipping transition {} -> {}", self.state, next);
            return;
        }
        info!("Session {:?}: {} -> {}", self.room_id, self.state, next);
        self.state = next;
        self.emit(SessionEvent::ConnectionStateChanged(next)).await;
    }

    fn arm_deadline(&mut self) {
        self.deadline = self
            .config
            .connect_timeout
            .map(|timeout| Instant::now() + timeout);
    }

    async fn emit_error(&self, err: &SignalingError) {
        self.emit(SessionEvent::Error {
            kind: err.kind(),
            detail: err.to_string(),
        })
        .await;
    }

    /// Never waits on the caller: a full channel drops the event.
    async fn emit(&self, event: SessionEvent) {
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!("Caller is not reading session events, dropped {:?}", event);
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Session event dropped, nobody is listening");
            }
        }
    }
}

async fn next_document(subscription: &mut Option<Subscription>) -> Option<RoomDocument> {
    match subscription {
        Some(s) => s.next().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(d).await,
        None => std::future::pending().await,
    }
}
