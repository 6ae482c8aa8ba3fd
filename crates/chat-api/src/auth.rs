use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{error, info, warn};

use chat_types::api::{ApiResponse, SignInRequest, SignUpRequest};

use crate::blocking;
use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::services::AuthError;
use crate::state::AppState;

pub async fn sign_up(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<SignUpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = blocking(move || {
        state
            .auth
            .create_user(&req.username, &req.password)
            .map_err(|e| match e {
                AuthError::UserExists => {
                    warn!("user already exists");
                    ApiError::from(e)
                }
                other => {
                    error!("failed to create user: {}", other);
                    ApiError::Internal("Failed to create user".to_string())
                }
            })
    })
    .await?;

    info!(user_id, "user created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(format!("Create user is successful, id: {user_id}"))),
    ))
}

pub async fn sign_in(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<SignInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let token = blocking(move || {
        state
            .auth
            .generate_token(&req.username, &req.password)
            .map_err(|e| {
                warn!("sign-in rejected: {}", e);
                ApiError::from(e)
            })
    })
    .await?;

    Ok(Json(ApiResponse::ok(format!(
        "Authorization successful, token: {token}"
    ))))
}
