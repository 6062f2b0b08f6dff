//! Chat listing and direct messaging.

pub mod service;

pub use service::{ChatService, HistoryQuery};
