mod signaling_coordinator;

pub use signaling_coordinator::*;
