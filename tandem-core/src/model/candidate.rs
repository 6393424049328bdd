use crate::model::role::Role;
use serde::{Deserialize, Serialize};

/// One trickled connectivity candidate.
///
/// `payload` is the engine's JSON candidate record and is treated as opaque;
/// two candidates are the same candidate when their payloads are equal.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
pub struct ConnectivityCandidate {
    pub payload: String,
    pub origin: Role,
}

impl ConnectivityCandidate {
    pub fn new(payload: impl Into<String>, origin: Role) -> Self {
        Self {
            payload: payload.into(),
            origin,
        }
    }
}
