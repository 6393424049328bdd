pub use tandem_core::model::{Role, RoomId};

pub mod model {
    pub use tandem_core::model::*;
}

#[cfg(feature = "signaling")]
pub mod signaling {
    pub use tandem_signaling::*;
}
