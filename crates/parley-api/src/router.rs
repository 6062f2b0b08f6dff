//! Route definitions for the Parley HTTP API.
//!
//! JSON routes are mounted under `/api`; the socket lives at `/ws`.

use axum::Router;
use axum::routing::{get, post, put};

use crate::handlers;
use crate::state::AppState;

/// Build the router with every route, threading `state` through `.with_state`.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(friend_routes())
        .merge(chat_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(handlers::ws::ws_upgrade))
        .with_state(state)
}

/// Register, login, logout, current profile
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/user", get(handlers::auth::current_user))
}

/// `PUT` takes a username or, with `?type=id`, an id; `DELETE` takes an id.
fn friend_routes() -> Router<AppState> {
    Router::new().route(
        "/users/{target}/friend",
        put(handlers::friend::add_friend).delete(handlers::friend::remove_friend),
    )
}

fn chat_routes() -> Router<AppState> {
    Router::new().route(
        "/chats/{id}/messages",
        post(handlers::chat::send_message).get(handlers::chat::list_messages),
    )
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
