//! Named broadcast groups.

pub mod membership;
pub mod names;
pub mod registry;
pub mod router;

pub use names::{direct_chat_room, user_room, user_session_room};
pub use registry::RoomRegistry;
pub use router::RoomRouter;
