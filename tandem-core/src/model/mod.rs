mod candidate;
mod description;
mod document;
mod role;
mod room;
mod signaling;

pub use candidate::ConnectivityCandidate;
pub use description::{SdpKind, SessionDescription};
pub use document::RoomDocument;
pub use role::Role;
pub use room::RoomId;
pub use signaling::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2, IceServerConfig};
