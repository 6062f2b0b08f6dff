//! `AuthUser` extractor: validates the bearer token and injects the request context.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use parley_core::error::{AppError, ErrorKind};
use parley_core::traits::TokenValidator;
use parley_realtime::connection::authenticator::parse_bearer;
use parley_service::RequestContext;

use crate::error::ApiError;
use crate::state::AppState;

/// Extracted authenticated user context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestContext);

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::authentication("Missing Authorization header"))?;
        let token = parse_bearer(header)?;

        // HTTP routes never need the relationship list.
        let identity = state
            .session_manager
            .validate_token(token, false)
            .await
            .map_err(|e| match e.kind {
                ErrorKind::NotFound => AppError::authentication("Invalid session."),
                _ => e,
            })?;
        Ok(AuthUser(RequestContext::from(identity)))
    }
}
