use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of the negotiation a session plays.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    /// Created the room and posted the offer.
    Initiator,
    /// Joined an existing room and posted the answer.
    Responder,
}

impl Role {
    pub fn counterpart(self) -> Self {
        match self {
            Self::Initiator => Self::Responder,
            Self::Responder => Self::Initiator,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initiator => f.write_str("initiator"),
            Self::Responder => f.write_str("responder"),
        }
    }
}
