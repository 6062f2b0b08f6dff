//! Registration, login, logout and the current profile.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use tracing::{info, warn};
use validator::Validate;

use crate::dto::request::CredentialsRequest;
use crate::dto::response::{MessageResponse, ProfileResponse, TokenResponse};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    let Json(req) = body?;
    req.validate()?;
    let user = state
        .session_manager
        .register_user(&req.username, &req.password)
        .await?;
    let login = state.session_manager.issue_session(user.id).await?;

    Ok((StatusCode::CREATED, Json(TokenResponse::from(login))))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Json(req) = body?;
    req.validate()?;
    let login = state.session_manager.login(&req.username, &req.password).await?;
    Ok(Json(TokenResponse::from(login)))
}

/// GET /api/auth/user
pub async fn current_user(auth: AuthUser) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        id: auth.user_id,
        username: auth.username.clone(),
    })
}

/// POST /api/auth/logout
///
/// Ends the session and closes every socket opened with it.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<MessageResponse>> {
    state.session_manager.delete_session(auth.session_id).await?;

    match state.realtime.fanout.logout_session(auth.session_id) {
        Ok(closed) => info!(user_id = %auth.user_id, session_id = %auth.session_id, closed, "Logged out"),
        Err(e) => warn!(session_id = %auth.session_id, error = %e, "Session sockets not closed"),
    }

    Ok(Json(MessageResponse::new("Logged out.")))
}
