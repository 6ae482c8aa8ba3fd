use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use chat_types::api::{
    ApiResponse, MessageAddRequest, MessageDeleteRequest, MessageGetRequest, MessageUpdateRequest,
};

use crate::blocking;
use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::middleware::{CurrentUser, ensure_same_user};
use crate::state::AppState;

pub async fn add_message(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidJson(req): ValidJson<MessageAddRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_same_user(user, req.user_id)?;

    let message_id = blocking(move || {
        state
            .messages
            .add_message(req.chat_id, req.user_id, &req.text)
            .map_err(|e| ApiError::from_store(e).context("Failed to create message"))
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(format!(
            "Message created successfully, id: {message_id}"
        ))),
    ))
}

/// Membership is checked by the store, so the requester is taken from the
/// token rather than the body.
pub async fn get_messages(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidJson(req): ValidJson<MessageGetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let chat_id = req.chat_id;
    let limit = req.limit.unwrap_or_default();
    let offset = req.offset.unwrap_or_default();

    let messages = blocking(move || {
        state
            .messages
            .get_messages(chat_id, user.0, limit, offset)
            .map_err(ApiError::from_store)
    })
    .await?;

    if messages.is_empty() {
        info!(chat_id, "no messages in chat");
        return Ok(Json(ApiResponse::ok(format!(
            "User has no messages in chat with id: {chat_id}"
        ))));
    }

    Ok(Json(ApiResponse::ok("Message get successfully").with_messages(messages)))
}

pub async fn update_message(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidJson(req): ValidJson<MessageUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_same_user(user, req.user_id)?;

    let message_id = blocking(move || {
        state
            .messages
            .update_message(req.message_id, req.user_id, &req.new_text)
            .map_err(ApiError::from_store)
    })
    .await?;

    info!(message_id, "message updated");
    Ok(Json(ApiResponse::ok(format!(
        "Message update successfully, id: {message_id}"
    ))))
}

pub async fn delete_messages(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidJson(req): ValidJson<MessageDeleteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message_ids = req.message_ids.unwrap_or_default();

    let outcomes = blocking(move || {
        state
            .messages
            .delete_messages(&message_ids, user.0)
            .map_err(|e| ApiError::from_store(e).context("Failed to delete messages"))
    })
    .await?;

    Ok(Json(
        ApiResponse::ok("Result of deleted messages").with_deleted_messages(outcomes),
    ))
}
