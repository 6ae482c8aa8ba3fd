use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

const ERR_EMPTY_HEADER: &str = "Authorization header is empty";
const ERR_INVALID_HEADER: &str = "Invalid authorization header";
const ERR_EMPTY_TOKEN: &str = "Token is empty";
const ERR_NO_USER: &str = "user id not found";
const BEARER: &str = "Bearer";

/// Identity resolved from the bearer token. Inserted into request
/// extensions by [`require_auth`] and read back by handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub i64);

/// Extract and validate JWT from Authorization header.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => value
            .to_str()
            .map_err(|_| ApiError::Unauthorized(ERR_INVALID_HEADER.to_string()))?,
        None => "",
    };

    let token = bearer_token(auth_header).inspect_err(|e| warn!("rejected request: {}", e))?;

    let user_id = state.auth.parse_token(token).map_err(|e| {
        warn!("rejected token: {}", e);
        ApiError::Unauthorized(e.to_string())
    })?;

    req.extensions_mut().insert(CurrentUser(user_id));
    Ok(next.run(req).await)
}

/// Splits `Bearer <token>` without consulting the token service.
fn bearer_token(header: &str) -> Result<&str, ApiError> {
    if header.is_empty() {
        return Err(ApiError::Unauthorized(ERR_EMPTY_HEADER.to_string()));
    }

    let parts: Vec<&str> = header.split(' ').collect();
    if parts.len() != 2 || parts[0] != BEARER {
        return Err(ApiError::Unauthorized(ERR_INVALID_HEADER.to_string()));
    }

    if parts[1].is_empty() {
        return Err(ApiError::Unauthorized(ERR_EMPTY_TOKEN.to_string()));
    }

    Ok(parts[1])
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .copied()
            .ok_or_else(|| ApiError::Unauthorized(ERR_NO_USER.to_string()))
    }
}

/// Identity in the token must match the identity the payload claims.
pub fn ensure_same_user(current: CurrentUser, claimed: i64) -> Result<(), ApiError> {
    if current.0 != claimed {
        warn!(token_user = current.0, claimed, "invalid user ID");
        return Err(ApiError::Forbidden("Invalid user ID".to_string()));
    }
    Ok(())
}
