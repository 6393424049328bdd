use crate::config::EngineConfig;
use crate::engine::EngineEvent;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tandem_core::{ConnectivityCandidate, Role, SessionDescription};
use tokio::sync::mpsc;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// The peer-connection engine a room session drives.
#[async_trait]
pub trait ConnectionEngine: Send + Sync {
    async fn add_local_track(&self, track: Arc<TrackLocalStaticSample>) -> Result<()>;

    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, description: &SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, description: &SessionDescription) -> Result<()>;

    async fn add_remote_candidate(&self, candidate: &ConnectivityCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Builds one engine per room session. Every event the engine emits goes to `events`.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn create(
        &self,
        role: Role,
        config: &EngineConfig,
        events: mpsc::Sender<EngineEvent>,
    ) -> Result<Box<dyn ConnectionEngine>>;
}
