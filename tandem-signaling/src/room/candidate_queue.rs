use crate::engine::ConnectionEngine;
use std::collections::{HashSet, VecDeque};
use tandem_core::ConnectivityCandidate;
use tracing::{debug, warn};

/// What happened to a candidate handed to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Applied,
    Buffered,
    /// Same payload was already applied or buffered.
    Duplicate,
    /// The engine refused it. It is consumed and never retried.
    Rejected,
}

/// Holds remote candidates until the remote description is set, and makes
/// sure each payload reaches the engine at most once.
#[derive(Debug, Default)]
pub struct CandidateQueue {
    pending: VecDeque<ConnectivityCandidate>,
    seen: HashSet<String>,
    applied: usize,
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enqueue_or_apply(
        &mut self,
        candidate: ConnectivityCandidate,
        can_apply_now: bool,
        engine: &dyn ConnectionEngine,
    ) -> Disposition {
        if !self.seen.insert(candidate.payload.clone()) {
            return Disposition::Duplicate;
        }

        if !can_apply_now {
            debug!(
                "Buffering {} candidate until remote description is set",
                candidate.origin
            );
            self.pending.push_back(candidate);
            return Disposition::Buffered;
        }

        self.apply(&candidate, engine).await
    }

    /// Applies everything buffered, in arrival order. Returns how many
    /// candidates the engine accepted.
    pub async fn flush(&mut self, engine: &dyn ConnectionEngine) -> usize {
        let mut accepted = 0;
        while let Some(candidate) = self.pending.pop_front() {
            if self.apply(&candidate, engine).await == Disposition::Applied {
                accepted += 1;
            }
        }
        accepted
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn applied_count(&self) -> usize {
        self.applied
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    async fn apply(
        &mut self,
        candidate: &ConnectivityCandidate,
        engine: &dyn ConnectionEngine,
    ) -> Disposition {
        match engine.add_remote_candidate(candidate).await {
            Ok(()) => {
                self.applied += 1;
                Disposition::Applied
            }
            Err(e) => {
                warn!("Engine rejected {} candidate: {:#}", candidate.origin, e);
                Disposition::Rejected
            }
        }
    }
}
