//! Request handlers, one module per route group.

pub mod auth;
pub mod chat;
pub mod friend;
pub mod health;
pub mod ws;
