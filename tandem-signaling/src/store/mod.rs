mod memory_store;
mod merge;
mod session_store;
mod subscription;

pub use memory_store::*;
pub use merge::*;
pub use session_store::*;
pub use subscription::*;
