//! # parley-auth
//!
//! Authentication for Parley: signed session tokens, Argon2id password
//! hashing, and the [`SessionManager`] that resolves tokens to identities
//! for both the HTTP routes and the real-time gateway.
//!
//! ## Modules
//!
//! - `jwt`: token claims, signing, and verification
//! - `password`: Argon2id password hashing
//! - `session`: session lifecycle (issue, validate, touch, delete) and
//!   periodic removal of expired sessions

pub mod jwt;
pub mod password;
pub mod session;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use password::PasswordHasher;
pub use session::{SessionCleanup, SessionManager};
