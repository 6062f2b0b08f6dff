//! # parley-database
//!
//! SQLite connection management, schema migrations, and the repositories
//! the services read and write through. Multi-row writes run inside one
//! [`Tx`] opened with [`Database::begin`] and finished with [`commit`].

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::{Database, Tx, commit};
