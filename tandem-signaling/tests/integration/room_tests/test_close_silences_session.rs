use tandem_core::Role;
use tandem_signaling::{EngineEvent, EngineState, MemoryStore, SessionEvent, SessionState};

use crate::integration::{create_test_room, init_tracing, join_test_room};
use crate::utils::{EngineCall, MockEngineFactory, drain_events, stored_document};

#[tokio::test]
async fn test_close_is_idempotent_and_stops_all_handling() {
    init_tracing();

    let store = MemoryStore::new();
    let factory = MockEngineFactory::new();
    let (mut initiator, mut events, room_id) = create_test_room(&store, &factory).await;
    let (mut responder, _responder_events) = join_test_room(&store, &factory, room_id).await;
    drain_events(&mut events);

    initiator.close().await;
    initiator.close().await;

    assert_eq!(initiator.state(), SessionState::Closed);
    let log = factory.log(Role::Initiator).await.expect("engine not created");
    assert_eq!(log.count(&EngineCall::Close).await, 1);
    // Only the responder is still subscribed
    assert_eq!(store.subscriber_count(&room_id), 1);

    let closed = drain_events(&mut events);
    assert_eq!(closed.len(), 1);
    assert!(matches!(
        closed[0],
        SessionEvent::ConnectionStateChanged(SessionState::Closed)
    ));

    // A notification carrying the answer and candidates arrives late
    responder
        .handle_engine_event(EngineEvent::LocalCandidate("b1".to_owned()))
        .await;
    let calls_before = log.calls().await;
    initiator
        .handle_store_change(stored_document(&store, &room_id).await)
        .await;
    initiator
        .handle_engine_event(EngineEvent::LocalCandidate("late".to_owned()))
        .await;
    initiator
        .handle_engine_event(EngineEvent::StateChanged(EngineState::Connected))
        .await;

    assert_eq!(log.calls().await, calls_before);
    assert!(initiator.remote_description().is_none());
    assert_eq!(initiator.state(), SessionState::Closed);
    assert!(drain_events(&mut events).is_empty());
    assert!(
        stored_document(&store, &room_id)
            .await
            .initiator_candidates
            .is_empty()
    );

    responder.close().await;
    assert_eq!(store.subscriber_count(&room_id), 0);
}

#[tokio::test]
async fn test_close_before_create_is_harmless() {
    init_tracing();

    let store = MemoryStore::new();
    let factory = MockEngineFactory::new();
    let (mut session, mut events) = crate::utils::new_session(&store, &factory);

    session.close().await;

    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(factory.created_count().await, 0);
    assert_eq!(drain_events(&mut events).len(), 1);
}
