use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use chat_db::ErrorKind;
use chat_types::api::{ApiResponse, ChatAddRequest, ChatDeleteRequest, ChatGetRequest};

use crate::blocking;
use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::middleware::{CurrentUser, ensure_same_user};
use crate::state::AppState;

pub async fn add_chat(
    State(state): State<AppState>,
    _user: CurrentUser,
    ValidJson(req): ValidJson<ChatAddRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let users = req.users.unwrap_or_default();

    let chat_id = blocking(move || {
        state
            .chats
            .create_chat(&req.chat_name, &users)
            .map_err(|e| match e.kind() {
                ErrorKind::UniqueViolation => ApiError::Conflict("Chat already exists".to_string()),
                _ => ApiError::from_store(e).context("Failed to create chat"),
            })
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(format!("Chat created successfully, id: {chat_id}"))),
    ))
}

pub async fn get_chats(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidJson(req): ValidJson<ChatGetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_same_user(user, req.user_id.unwrap_or_default())?;

    let chats = blocking(move || {
        state
            .chats
            .get_chats(user.0)
            .map_err(|e| ApiError::from_store(e).context("Failed to get chats"))
    })
    .await?;

    if chats.is_empty() {
        info!(user_id = user.0, "user has no chats");
        return Ok(Json(ApiResponse::ok("User has no chats")));
    }

    Ok(Json(ApiResponse::ok("Chats get successfully").with_chats(chats)))
}

pub async fn delete_chats(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidJson(req): ValidJson<ChatDeleteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let chat_ids = req.chat_ids.unwrap_or_default();

    let outcomes = blocking(move || {
        state
            .chats
            .delete_chats(&chat_ids, user.0)
            .map_err(|e| ApiError::from_store(e).context("Failed to delete chats"))
    })
    .await?;

    Ok(Json(
        ApiResponse::ok("Result of deleted chats").with_deleted_chats(outcomes),
    ))
}
