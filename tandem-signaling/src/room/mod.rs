mod candidate_queue;
mod room_command;
mod room_handle;
mod room_session;
mod room_state;
mod session_event;

pub use candidate_queue::*;
pub use room_command::*;
pub use room_handle::*;
pub use room_session::*;
pub use room_state::*;
pub use session_event::*;
