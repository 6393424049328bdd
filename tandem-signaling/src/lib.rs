mod config;
mod coordinator;
mod engine;
mod error;
mod media;
mod room;
mod store;

pub use config::*;
pub use coordinator::*;
pub use engine::*;
pub use error::*;
pub use media::*;
pub use room::*;
pub use store::*;
