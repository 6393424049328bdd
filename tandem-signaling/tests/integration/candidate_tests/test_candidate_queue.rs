use tandem_core::{ConnectivityCandidate, Role};
use tandem_signaling::{CandidateQueue, Disposition, EngineConfig, EngineFactory};
use tokio::sync::mpsc;

use crate::integration::init_tracing;
use crate::utils::{MockEngineBehavior, MockEngineFactory};

fn from_responder(payload: &str) -> ConnectivityCandidate {
    ConnectivityCandidate::new(payload, Role::Responder)
}

#[tokio::test]
async fn test_queue_buffers_then_flushes_in_order() {
    init_tracing();

    let factory = MockEngineFactory::new();
    let (events_tx, _events_rx) = mpsc::channel(8);
    let engine = factory
        .create(Role::Initiator, &EngineConfig::default(), events_tx)
        .await
        .expect("Failed to create engine");
    let log = factory.log(Role::Initiator).await.expect("engine not created");

    let mut queue = CandidateQueue::new();
    assert_eq!(
        queue.enqueue_or_apply(from_responder("c1"), false, &*engine).await,
        Disposition::Buffered
    );
    assert_eq!(
        queue.enqueue_or_apply(from_responder("c2"), false, &*engine).await,
        Disposition::Buffered
    );
    assert_eq!(
        queue.enqueue_or_apply(from_responder("c1"), false, &*engine).await,
        Disposition::Duplicate
    );
    assert_eq!(queue.pending_len(), 2);
    assert!(log.applied_candidates().await.is_empty());

    assert_eq!(queue.flush(&*engine).await, 2);
    assert_eq!(
        queue.enqueue_or_apply(from_responder("c3"), true, &*engine).await,
        Disposition::Applied
    );
    assert_eq!(
        queue.enqueue_or_apply(from_responder("c2"), true, &*engine).await,
        Disposition::Duplicate
    );

    assert_eq!(queue.pending_len(), 0);
    assert_eq!(queue.applied_count(), 3);
    assert_eq!(log.applied_candidates().await, vec!["c1", "c2", "c3"]);
}

#[tokio::test]
async fn test_flush_skips_rejected_candidates() {
    init_tracing();

    let factory = MockEngineFactory::with_behavior(MockEngineBehavior {
        reject_candidates: vec!["bad".to_owned()],
        ..Default::default()
    });
    let (events_tx, _events_rx) = mpsc::channel(8);
    let engine = factory
        .create(Role::Responder, &EngineConfig::default(), events_tx)
        .await
        .expect("Failed to create engine");

    let mut queue = CandidateQueue::new();
    for payload in ["c1", "bad", "c2"] {
        queue
            .enqueue_or_apply(ConnectivityCandidate::new(payload, Role::Initiator), false, &*engine)
            .await;
    }

    assert_eq!(queue.flush(&*engine).await, 2);
    assert_eq!(queue.pending_len(), 0);
    assert_eq!(
        queue
            .enqueue_or_apply(ConnectivityCandidate::new("bad", Role::Initiator), true, &*engine)
            .await,
        Disposition::Duplicate
    );
}

#[tokio::test]
async fn test_clear_drops_pending_candidates() {
    let factory = MockEngineFactory::new();
    let (events_tx, _events_rx) = mpsc::channel(8);
    let engine = factory
        .create(Role::Initiator, &EngineConfig::default(), events_tx)
        .await
        .expect("Failed to create engine");

    let mut queue = CandidateQueue::new();
    queue.enqueue_or_apply(from_responder("c1"), false, &*engine).await;
    queue.clear();

    assert_eq!(queue.pending_len(), 0);
    assert_eq!(queue.flush(&*engine).await, 0);
}
