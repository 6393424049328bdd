use tandem_core::Role;
use tandem_signaling::{MemoryStore, SessionEvent, SessionState, SignalingError};

use crate::integration::{create_test_room, init_tracing};
use crate::utils::{
    EngineCall, MockEngineFactory, drain_events, empty_media, new_session, stored_document,
};

#[tokio::test]
async fn test_create_room_posts_offer() {
    init_tracing();

    let store = MemoryStore::new();
    let factory = MockEngineFactory::new();
    let (session, mut events, room_id) = create_test_room(&store, &factory).await;

    assert_eq!(session.state(), SessionState::DescriptionSent);
    assert_eq!(session.role(), Some(Role::Initiator));
    assert_eq!(session.room_id(), Some(room_id));

    // The stored offer is exactly the local description
    let document = stored_document(&store, &room_id).await;
    let offer = session.local_description().cloned().expect("offer not recorded");
    assert_eq!(document.offer, Some(offer.clone()));
    assert!(document.answer.is_none());
    assert!(document.initiator_candidates.is_empty());
    assert!(document.responder_candidates.is_empty());

    // Subscribed to its own room
    assert_eq!(store.subscriber_count(&room_id), 1);

    let log = factory.log(Role::Initiator).await.expect("engine not created");
    assert_eq!(
        log.calls().await,
        vec![
            EngineCall::AddLocalTrack("audio".to_owned()),
            EngineCall::CreateOffer,
            EngineCall::SetLocal(offer),
        ]
    );

    let emitted = drain_events(&mut events);
    assert_eq!(emitted.len(), 1);
    assert!(matches!(
        emitted[0],
        SessionEvent::ConnectionStateChanged(SessionState::DescriptionSent)
    ));
}

#[tokio::test]
async fn test_create_room_without_media_writes_nothing() {
    init_tracing();

    let store = MemoryStore::new();
    let factory = MockEngineFactory::new();
    let (mut session, mut events) = new_session(&store, &factory);

    let err = session.create_room(&empty_media()).await.unwrap_err();

    assert!(matches!(err, SignalingError::MediaUnavailable(_)));
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(store.room_count(), 0);
    assert_eq!(factory.created_count().await, 0);
    assert!(drain_events(&mut events).is_empty());
}

#[tokio::test]
async fn test_second_create_on_same_session_is_rejected() {
    init_tracing();

    let store = MemoryStore::new();
    let factory = MockEngineFactory::new();
    let (mut session, _events, _room_id) = create_test_room(&store, &factory).await;

    let err = session
        .create_room(&crate::utils::audio_media().await)
        .await
        .unwrap_err();

    assert!(matches!(err, SignalingError::SessionAlreadyActive));
    assert_eq!(store.room_count(), 1);
    assert_eq!(factory.created_count().await, 1);
}
