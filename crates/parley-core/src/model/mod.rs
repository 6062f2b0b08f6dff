//! Chat domain models shared by the store, the services, and the real-time core.

pub mod chat;
pub mod identity;
pub mod presence;
pub mod session;
pub mod user;

pub use chat::{Chat, ChatRecipient, ChatType, Message};
pub use identity::Identity;
pub use presence::{OnlineStatus, RelatedUser};
pub use session::Session;
pub use user::{Relation, RelationStatus, User};
