//! Collaborator traits consumed by the real-time core.
//!
//! The core never reaches into storage or token handling directly; it is
//! handed implementations of these traits at startup.

pub mod directory;
pub mod presence;
pub mod token;

pub use directory::{ChatDirectory, UserDirectory};
pub use presence::PresenceLookup;
pub use token::TokenValidator;
