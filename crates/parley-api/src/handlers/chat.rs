//! Direct messages.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use validator::Validate;

use parley_core::model::Message;
use parley_core::types::ChatId;
use parley_service::HistoryQuery;

use crate::dto::request::{MessagesQuery, SendMessageRequest};
use crate::dto::response::SentMessageResponse;
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/chats/{id}/messages
pub async fn send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    path: Result<Path<ChatId>, PathRejection>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SentMessageResponse>)> {
    let Path(chat_id) = path?;
    let Json(req) = body?;
    req.validate()?;
    let message = state
        .chat_service
        .send_direct_message(&auth, chat_id, &req.content, req.ack_id.clone())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SentMessageResponse {
            message,
            ack_id: req.ack_id,
        }),
    ))
}

/// GET /api/chats/{id}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    path: Result<Path<ChatId>, PathRejection>,
    query: Result<Query<MessagesQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Message>>> {
    let Path(chat_id) = path?;
    let Query(query) = query?;
    let history = HistoryQuery {
        before: query.before,
        after: query.after,
        limit: query.limit,
    };
    let messages = state.chat_service.get_messages(&auth, chat_id, history).await?;
    Ok(Json(messages))
}
