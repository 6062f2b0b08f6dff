//! Friend requests.

use axum::Json;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};

use parley_core::error::AppError;
use parley_core::types::UserId;
use parley_service::{FriendResult, FriendTarget};

use crate::dto::request::{FriendLookup, FriendQuery};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// PUT /api/users/{usernameOrId}/friend?type=id
///
/// The segment is a username unless `type=id` is given.
pub async fn add_friend(
    State(state): State<AppState>,
    auth: AuthUser,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<FriendQuery>, QueryRejection>,
) -> ApiResult<Json<FriendResult>> {
    let Path(segment) = path?;
    let Query(query) = query?;
    let target = match query.lookup {
        FriendLookup::Id => FriendTarget::Id(parse_user_id(&segment)?),
        FriendLookup::Username => FriendTarget::Username(segment),
    };
    Ok(Json(state.user_service.add_friend(&auth, target).await?))
}

/// DELETE /api/users/{id}/friend
pub async fn remove_friend(
    State(state): State<AppState>,
    auth: AuthUser,
    path: Result<Path<UserId>, PathRejection>,
) -> ApiResult<Json<FriendResult>> {
    let Path(receiver_id) = path?;
    Ok(Json(state.user_service.remove_friend(&auth, receiver_id).await?))
}

fn parse_user_id(segment: &str) -> Result<UserId, AppError> {
    segment
        .parse()
        .map_err(|_| AppError::validation("Invalid id."))
}
