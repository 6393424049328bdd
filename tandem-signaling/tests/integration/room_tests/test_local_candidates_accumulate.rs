use tandem_signaling::{EngineEvent, MemoryStore};

use crate::integration::{create_test_room, init_tracing, join_test_room};
use crate::utils::{MockEngineFactory, stored_document};

fn candidate(payload: &str) -> EngineEvent {
    EngineEvent::LocalCandidate(payload.to_owned())
}

#[tokio::test]
async fn test_local_candidates_accumulate_per_role() {
    init_tracing();

    let store = MemoryStore::new();
    let factory = MockEngineFactory::new();
    let (mut initiator, _events, room_id) = create_test_room(&store, &factory).await;

    initiator.handle_engine_event(candidate("a1")).await;
    initiator.handle_engine_event(candidate("a2")).await;
    initiator.handle_engine_event(candidate("a1")).await;

    let (mut responder, _responder_events) = join_test_room(&store, &factory, room_id).await;
    responder.handle_engine_event(candidate("b1")).await;
    initiator.handle_engine_event(candidate("a3")).await;
    responder.handle_engine_event(candidate("b2")).await;

    let document = stored_document(&store, &room_id).await;
    assert_eq!(document.initiator_candidates, vec!["a1", "a2", "a3"]);
    assert_eq!(document.responder_candidates, vec!["b1", "b2"]);

    // Neither writer dropped the other's fields
    assert!(document.offer.is_some());
    assert!(document.answer.is_some());
}
