//! Application builder: wires stores, auth, services and the real-time hub
//! into an Axum app and serves it.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use parley_auth::{JwtDecoder, JwtEncoder, PasswordHasher, SessionCleanup, SessionManager};
use parley_core::config::AppConfig;
use parley_core::error::AppError;
use parley_core::result::AppResult;
use parley_core::traits::{ChatDirectory, TokenValidator, UserDirectory};
use parley_database::Database;
use parley_database::repositories::{
    ChatRepository, MessageRepository, SessionRepository, UserRepository,
};
use parley_realtime::RealtimeHub;
use parley_service::{ChatService, UserService};

use crate::router::build_router;
use crate::state::AppState;

/// Construct every shared component.
///
/// The database is opened and migrated first. The hub is built next so the
/// services can be handed its fan-out; the gateway is built last, once the
/// services that back its lookups exist.
pub async fn build_state(config: AppConfig) -> AppResult<AppState> {
    // ── Database and repositories ────────────────────────────────
    let db = Database::connect(&config.database).await?;
    let user_repo = Arc::new(UserRepository::new(db.clone()));
    let session_repo = Arc::new(SessionRepository::new(db.clone()));
    let chat_repo = Arc::new(ChatRepository::new(db.clone()));
    let message_repo = Arc::new(MessageRepository::new(db.clone()));

    // ── Auth ─────────────────────────────────────────────────────
    let session_manager = Arc::new(SessionManager::new(
        Arc::new(JwtEncoder::new(&config.auth)),
        Arc::new(JwtDecoder::new(&config.auth)),
        Arc::clone(&session_repo),
        Arc::clone(&user_repo),
        Arc::new(PasswordHasher::new()),
        config.auth.clone(),
    ));
    let session_cleanup = Arc::new(SessionCleanup::new(
        session_repo,
        Duration::from_secs(config.auth.session_cleanup_interval_seconds),
    ));

    // ── Real-time, phase one ─────────────────────────────────────
    let realtime = Arc::new(RealtimeHub::new(config.realtime.clone()));

    // ── Services ─────────────────────────────────────────────────
    let user_service = Arc::new(UserService::new(
        db.clone(),
        Arc::clone(&user_repo),
        Arc::clone(&chat_repo),
        Arc::clone(&realtime.fanout),
    ));
    let chat_service = Arc::new(ChatService::new(
        db.clone(),
        chat_repo,
        message_repo,
        user_repo,
        Arc::clone(&realtime.fanout),
    ));

    // ── Real-time, phase two ─────────────────────────────────────
    let gateway = Arc::new(realtime.gateway(
        Arc::clone(&session_manager) as Arc<dyn TokenValidator>,
        Arc::clone(&user_service) as Arc<dyn UserDirectory>,
        Arc::clone(&chat_service) as Arc<dyn ChatDirectory>,
    ));

    Ok(AppState {
        config: Arc::new(config),
        db,
        session_manager,
        session_cleanup,
        user_service,
        chat_service,
        realtime,
        gateway,
    })
}

/// Routes plus the HTTP layers.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind, serve until Ctrl-C, then close every socket and the database.
pub async fn run_server(config: AppConfig) -> AppResult<()> {
    let addr = config.server.bind_addr();
    let state = build_state(config).await?;
    let hub = Arc::clone(&state.realtime);
    let db = state.db.clone();

    let cancel = CancellationToken::new();
    let cleanup = tokio::spawn({
        let cleanup = Arc::clone(&state.session_cleanup);
        let cancel = cancel.clone();
        async move { cleanup.run(cancel).await }
    });

    let app = build_app(state);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    info!(addr = %addr, "Parley server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Sockets are long-lived; close them so the drain can finish.
            if let Err(e) = hub.shutdown() {
                error!(error = %e, "Real-time shutdown failed");
            }
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    cancel.cancel();
    if let Err(e) = cleanup.await {
        error!(error = %e, "Session cleanup task failed");
    }
    db.close().await;
    info!("Parley server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
