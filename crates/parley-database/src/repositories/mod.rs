//! Repository implementations for all Parley entities.

pub mod chat;
pub mod message;
pub mod session;
pub mod user;

pub use chat::ChatRepository;
pub use message::MessageRepository;
pub use session::SessionRepository;
pub use user::UserRepository;
