//! # parley-api
//!
//! HTTP API layer for Parley built on Axum.
//!
//! Provides the auth, friend and chat endpoints, the health probe, the
//! WebSocket upgrade, the bearer-token extractor, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use app::{build_app, build_state, run_server};
pub use error::ApiError;
pub use state::AppState;
