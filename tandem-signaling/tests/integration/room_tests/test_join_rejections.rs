use tandem_core::{RoomDocument, RoomId};
use tandem_signaling::{MemoryStore, SessionState, SessionStore, SignalingError};

use crate::integration::{create_test_room, init_tracing, join_test_room};
use crate::utils::{MockEngineFactory, audio_media, empty_media, new_session, stored_document};

#[tokio::test]
async fn test_join_unknown_room_writes_nothing() {
    init_tracing();

    let store = MemoryStore::new();
    let factory = MockEngineFactory::new();
    let (mut session, _events) = new_session(&store, &factory);
    let room_id = RoomId::new();

    let err = session.join_room(room_id, &audio_media().await).await.unwrap_err();

    assert!(matches!(err, SignalingError::RoomNotFound(id) if id == room_id));
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(store.room_count(), 0);
    assert_eq!(factory.created_count().await, 0);
}

#[tokio::test]
async fn test_join_room_without_offer_is_not_found() {
    init_tracing();

    let store = MemoryStore::new();
    let factory = MockEngineFactory::new();
    let room_id = RoomId::new();
    store.set(&room_id, RoomDocument::default()).await.unwrap();

    let (mut session, _events) = new_session(&store, &factory);
    let err = session.join_room(room_id, &audio_media().await).await.unwrap_err();

    assert!(matches!(err, SignalingError::RoomNotFound(_)));
    assert_eq!(stored_document(&store, &room_id).await, RoomDocument::default());
}

#[tokio::test]
async fn test_third_participant_gets_room_full() {
    init_tracing();

    let store = MemoryStore::new();
    let factory = MockEngineFactory::new();
    let (_initiator, _events, room_id) = create_test_room(&store, &factory).await;
    let (responder, _responder_events) = join_test_room(&store, &factory, room_id).await;

    let (mut late, _late_events) = new_session(&store, &factory);
    let err = late.join_room(room_id, &audio_media().await).await.unwrap_err();

    assert!(matches!(err, SignalingError::RoomFull(id) if id == room_id));
    assert_eq!(late.state(), SessionState::Idle);

    // The first answer stays in place
    let document = stored_document(&store, &room_id).await;
    assert_eq!(document.answer.as_ref(), responder.local_description());
}

#[tokio::test]
async fn test_join_without_media_fails() {
    init_tracing();

    let store = MemoryStore::new();
    let factory = MockEngineFactory::new();
    let (_initiator, _events, room_id) = create_test_room(&store, &factory).await;

    let (mut session, _session_events) = new_session(&store, &factory);
    let err = session.join_room(room_id, &empty_media()).await.unwrap_err();

    assert!(matches!(err, SignalingError::MediaUnavailable(_)));
    assert!(stored_document(&store, &room_id).await.answer.is_none());
}
