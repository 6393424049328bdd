use std::sync::Arc;
use std::time::Duration;

use tandem_signaling::{
    MediaConstraints, MemoryStore, SessionConfig, SessionEvent, SessionState,
    SignalingCoordinator, SyntheticMediaSource,
};
use tokio::sync::mpsc;

use crate::integration::init_tracing;
use crate::utils::stored_document;

/// Host candidates only, so no STUN traffic leaves the machine.
fn loopback_config() -> SessionConfig {
    SessionConfig::default()
        .with_ice_servers(Vec::new())
        .with_connect_timeout(Some(Duration::from_secs(20)))
}

async fn wait_connected(rx: &mut mpsc::Receiver<SessionEvent>) -> bool {
    let wait = async {
        while let Some(event) = rx.recv().await {
            match event {
                SessionEvent::ConnectionStateChanged(SessionState::Connected) => return true,
                SessionEvent::ConnectionStateChanged(SessionState::Failed) => return false,
                other => tracing::info!("Loopback event: {:?}", other),
            }
        }
        false
    };
    tokio::time::timeout(Duration::from_secs(25), wait)
        .await
        .unwrap_or(false)
}

#[tokio::test]
#[ignore = "needs a non-loopback network interface for host candidates"]
async fn test_webrtc_peers_connect_through_memory_store() {
    init_tracing();

    let store = MemoryStore::new();
    let media = Arc::new(SyntheticMediaSource::default());
    let (initiator, mut initiator_events) =
        SignalingCoordinator::webrtc(Arc::new(store.clone()), media.clone(), loopback_config());
    let (responder, mut responder_events) =
        SignalingCoordinator::webrtc(Arc::new(store.clone()), media, loopback_config());

    let room_id = initiator
        .create_room(&MediaConstraints::default())
        .await
        .expect("Failed to create room");
    responder
        .join_room(room_id, &MediaConstraints::default())
        .await
        .expect("Failed to join room");

    let (initiator_connected, responder_connected) = tokio::join!(
        wait_connected(&mut initiator_events),
        wait_connected(&mut responder_events),
    );
    assert!(initiator_connected, "initiator never connected");
    assert!(responder_connected, "responder never connected");

    let document = stored_document(&store, &room_id).await;
    assert!(!document.initiator_candidates.is_empty());
    assert!(!document.responder_candidates.is_empty());

    initiator.leave_room().await;
    responder.leave_room().await;
}
