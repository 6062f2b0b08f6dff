//! Relationship lookups and the friend request flow.

pub mod relations;
pub mod service;

pub use relations::{AddFriendPlan, RemoveFriendPlan};
pub use service::{FriendResult, FriendTarget, UserService};
