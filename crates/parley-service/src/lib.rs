//! # parley-service
//!
//! Business logic service layer for Parley. Each service reads through the
//! repositories, commits multi-row writes in one transaction, and only then
//! hands the change to the real-time fan-out.
//!
//! The services also implement the directory traits the real-time core
//! consumes, which is what closes the second wiring phase.

pub mod chat;
pub mod context;
pub mod user;

pub use chat::{ChatService, HistoryQuery};
pub use context::RequestContext;
pub use user::{FriendResult, FriendTarget, UserService};

#[cfg(test)]
pub(crate) mod testing;
