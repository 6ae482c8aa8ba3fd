use axum::{
    Json, Router, middleware,
    routing::{delete, get, post, put},
};

use chat_types::api::ApiResponse;

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{auth, chats, messages};

/// All routes. Everything outside `/auth` and `/health` requires a bearer token.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/sign-up", post(auth::sign_up))
        .route("/auth/sign-in", post(auth::sign_in));

    let protected_routes = Router::new()
        .route("/chats/add", post(chats::add_chat))
        .route("/chats/get", post(chats::get_chats))
        .route("/chats/delete", delete(chats::delete_chats))
        .route("/messages/add", post(messages::add_message))
        .route("/messages/get", post(messages::get_messages))
        .route("/messages/update", put(messages::update_message))
        .route("/messages/delete", delete(messages::delete_messages))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> Json<ApiResponse> {
    Json(ApiResponse::ok("ok"))
}
