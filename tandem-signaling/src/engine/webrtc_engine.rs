use crate::config::EngineConfig;
use crate::engine::{ConnectionEngine, EngineEvent, EngineFactory, EngineState};
use crate::media::{MediaKind, RemoteTrack};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tandem_core::{ConnectivityCandidate, Role, SdpKind, SessionDescription};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// [`ConnectionEngine`] backed by a `webrtc` peer connection.
pub struct WebRtcEngine {
    role: Role,
    peer_connection: Arc<RTCPeerConnection>,
}

impl WebRtcEngine {
    /// Builds the peer connection and wires its callbacks into `event_tx`.
    pub async fn new(
        role: Role,
        config: &EngineConfig,
        event_tx: mpsc::Sender<EngineEvent>,
    ) -> Result<Self> {
        // 1. MediaEngine with the default audio/video codecs
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        // 2. Interceptors (RTCP reports, NACK)
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        // 3. API object
        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        // 4. ICE servers from the session config
        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ice_candidate_pool_size: config.ice_candidate_pool_size,
            ..Default::default()
        };

        // 5. PeerConnection
        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        // --- Callbacks ---
        // Each closure owns a clone of event_tx and only forwards events.

        // A. Connection state
        let state_tx = event_tx.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    info!("Peer connection state changed for {}: {:?}", role, s);
                    let state = match s {
                        RTCPeerConnectionState::Connecting => EngineState::Connecting,
                        RTCPeerConnectionState::Connected => EngineState::Connected,
                        RTCPeerConnectionState::Disconnected => EngineState::Disconnected,
                        RTCPeerConnectionState::Failed => EngineState::Failed,
                        RTCPeerConnectionState::Closed => EngineState::Closed,
                        _ => EngineState::New,
                    };
                    let _ = tx.send(EngineEvent::StateChanged(state)).await;
                })
            },
        ));

        // B. Trickle ICE: local candidates as JSON records
        let ice_tx = event_tx.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else {
                    debug!("ICE gathering complete for {}", role);
                    return;
                };
                let Ok(json_candidate) = candidate.to_json() else {
                    return;
                };
                let Ok(str_candidate) = serde_json::to_string(&json_candidate) else {
                    return;
                };
                let _ = tx.send(EngineEvent::LocalCandidate(str_candidate)).await;
            })
        }));

        // C. Incoming remote tracks
        let track_tx = event_tx;
        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            let tx = track_tx.clone();

            Box::pin(async move {
                let remote = RemoteTrack {
                    id: track.id().to_string(),
                    stream_id: track.stream_id().to_string(),
                    kind: MediaKind::from_codec_type(track.kind()),
                    track: Some(track),
                };
                info!("Remote track {:?} arrived for {}", remote, role);
                let _ = tx.send(EngineEvent::RemoteTrack(remote)).await;
            })
        }));

        Ok(Self {
            role,
            peer_connection,
        })
    }

    fn to_rtc(description: &SessionDescription) -> Result<RTCSessionDescription> {
        let sdp = description.sdp.clone();
        let desc = match description.kind {
            SdpKind::Offer => RTCSessionDescription::offer(sdp)?,
            SdpKind::Answer => RTCSessionDescription::answer(sdp)?,
        };
        Ok(desc)
    }
}

#[async_trait]
impl ConnectionEngine for WebRtcEngine {
    async fn add_local_track(&self, track: Arc<TrackLocalStaticSample>) -> Result<()> {
        let sender = self
            .peer_connection
            .add_track(track as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .context("Failed to add local track")?;

        // Interceptors only run while someone drains RTCP from the sender.
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while sender.read(&mut buf).await.is_ok() {}
        });
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .context("Failed to create offer")?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .context("Failed to create answer")?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, description: &SessionDescription) -> Result<()> {
        self.peer_connection
            .set_local_description(Self::to_rtc(description)?)
            .await
            .context("Failed to set local description")?;
        Ok(())
    }

    async fn set_remote_description(&self, description: &SessionDescription) -> Result<()> {
        self.peer_connection
            .set_remote_description(Self::to_rtc(description)?)
            .await
            .context("Failed to set remote description")?;
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: &ConnectivityCandidate) -> Result<()> {
        let init: RTCIceCandidateInit = serde_json::from_str(&candidate.payload)
            .context("Failed to parse ICE candidate JSON")?;
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if let Err(e) = self.peer_connection.close().await {
            warn!("Closing peer connection for {} failed: {:?}", self.role, e);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Creates a [`WebRtcEngine`] per session.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebRtcEngineFactory;

#[async_trait]
impl EngineFactory for WebRtcEngineFactory {
    async fn create(
        &self,
        role: Role,
        config: &EngineConfig,
        events: mpsc::Sender<EngineEvent>,
    ) -> Result<Box<dyn ConnectionEngine>> {
        Ok(Box::new(WebRtcEngine::new(role, config, events).await?))
    }
}
