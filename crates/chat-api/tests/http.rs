use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    routing::get,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use chat_api::middleware::CurrentUser;
use chat_api::token::{DEFAULT_TTL_SECS, TokenService};
use chat_api::{AppStateInner, router};
use chat_crypto::SecretCipher;
use chat_db::Database;
use chat_types::api::ApiResponse;

fn app() -> Router {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let state = AppStateInner::new(
        db,
        SecretCipher::new("0123456789abcdef"),
        TokenService::new(b"integration-signing-key", DEFAULT_TTL_SECS),
    );
    router(state)
}

async fn raw(
    app: &Router,
    method: Method,
    uri: &str,
    auth: Option<&str>,
    body: String,
) -> (StatusCode, ApiResponse) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = auth {
        builder = builder.header(header::AUTHORIZATION, value);
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, ApiResponse) {
    let auth = token.map(|t| format!("Bearer {t}"));
    raw(app, method, uri, auth.as_deref(), body.to_string()).await
}

async fn sign_up(app: &Router, username: &str, password: &str) -> (StatusCode, ApiResponse) {
    call(
        app,
        Method::POST,
        "/auth/sign-up",
        None,
        json!({ "username": username, "password": password }),
    )
    .await
}

async fn sign_in(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/auth/sign-in",
        None,
        json!({ "username": username, "password": password }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body:?}");

    body.message
        .unwrap()
        .strip_prefix("Authorization successful, token: ")
        .unwrap()
        .to_string()
}

/// Andrey (1) and Boris (2) share chat 1; Carol (3) is an outsider.
async fn seeded() -> (Router, [String; 3]) {
    let app = app();
    for name in ["Andrey", "Boris", "Carol"] {
        sign_up(&app, name, "adgui*").await;
    }
    let tokens = [
        sign_in(&app, "Andrey", "adgui*").await,
        sign_in(&app, "Boris", "adgui*").await,
        sign_in(&app, "Carol", "adgui*").await,
    ];

    let (status, body) = call(
        &app,
        Method::POST,
        "/chats/add",
        Some(&tokens[0]),
        json!({ "chat_name": "friends", "users": [1, 2] }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.message.as_deref(), Some("Chat created successfully, id: 1"));

    (app, tokens)
}

#[tokio::test]
async fn health_is_public() {
    let (status, body) = call(&app(), Method::GET, "/health", None, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_ok());
}

#[tokio::test]
async fn duplicate_sign_up_is_a_conflict() {
    let app = app();

    let (status, body) = sign_up(&app, "Andrey", "adgui*").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.message.as_deref(), Some("Create user is successful, id: 1"));

    let (status, body) = sign_up(&app, "Andrey", "adgui*").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body.status, "Error");
    assert_eq!(body.error.as_deref(), Some("User already exists"));
}

#[tokio::test]
async fn sign_in_rejections() {
    let app = app();
    sign_up(&app, "Andrey", "adgui*").await;

    let body = json!({ "username": "Boris", "password": "adgui*" });
    let (status, resp) = call(&app, Method::POST, "/auth/sign-in", None, body).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(resp.error.as_deref(), Some("User not found"));

    let body = json!({ "username": "Andrey", "password": "wrong*" });
    let (status, resp) = call(&app, Method::POST, "/auth/sign-in", None, body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.error.as_deref(), Some("incorrect password"));
}

#[tokio::test]
async fn request_bodies_are_validated() {
    let app = app();

    let (status, body) = raw(&app, Method::POST, "/auth/sign-up", None, String::new()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.error.as_deref(), Some("Empty request"));

    let (status, body) = raw(&app, Method::POST, "/auth/sign-up", None, "{".into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.error.as_deref(), Some("Invalid request"));

    let (status, body) = sign_up(&app, "", "adgui").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body.error.as_deref(),
        Some(
            "Field Username is a required field, Field Password must contain at least 6 characters"
        )
    );
}

#[tokio::test]
async fn protected_routes_check_the_header() {
    let app = app();
    let body = || json!({ "user_id": 1 }).to_string();

    let cases = [
        (None, "Authorization header is empty"),
        (Some("Token abc"), "Invalid authorization header"),
        (Some("Bearer a b"), "Invalid authorization header"),
        (Some("Bearer "), "Token is empty"),
    ];
    for (auth, expected) in cases {
        let (status, resp) = raw(&app, Method::POST, "/chats/get", auth, body()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(resp.error.as_deref(), Some(expected));
    }

    let (status, resp) = raw(&app, Method::POST, "/chats/get", Some("Bearer abc"), body()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(resp.error.unwrap().starts_with("token is malformed"));
}

#[tokio::test]
async fn identity_is_missing_without_the_auth_layer() {
    let bare = Router::new().route(
        "/whoami",
        get(|user: CurrentUser| async move { user.0.to_string() }),
    );

    let (status, resp) = raw(&bare, Method::GET, "/whoami", None, String::new()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.status, "Error");
    assert_eq!(resp.error.as_deref(), Some("user id not found"));
}

#[tokio::test]
async fn chats_are_listed_for_their_members_only() {
    let (app, tokens) = seeded().await;

    let (status, body) =
        call(&app, Method::POST, "/chats/get", Some(&tokens[0]), json!({ "user_id": 1 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.message.as_deref(), Some("Chats get successfully"));
    assert_eq!(body.chats_list.unwrap()[0].name, "friends");

    let (status, body) =
        call(&app, Method::POST, "/chats/get", Some(&tokens[2]), json!({ "user_id": 3 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.message.as_deref(), Some("User has no chats"));
    assert!(body.chats_list.is_none());

    // Asking for someone else's chats
    let (status, body) =
        call(&app, Method::POST, "/chats/get", Some(&tokens[2]), json!({ "user_id": 1 })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body.error.as_deref(), Some("Invalid user ID"));

    // Zero passes validation and fails the identity check
    let (status, body) =
        call(&app, Method::POST, "/chats/get", Some(&tokens[0]), json!({ "user_id": 0 })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body.error.as_deref(), Some("Invalid user ID"));

    let (status, body) =
        call(&app, Method::POST, "/chats/get", Some(&tokens[0]), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.error.as_deref(), Some("Field UserID is a required field"));
}

#[tokio::test]
async fn chat_members_must_be_listed() {
    let (app, tokens) = seeded().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/chats/add",
        Some(&tokens[0]),
        json!({ "chat_name": "chat_1", "users": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.error.as_deref(), Some("Field Users must have at least 2 elements"));

    let (status, body) = call(
        &app,
        Method::POST,
        "/chats/add",
        Some(&tokens[0]),
        json!({ "chat_name": "chat_1" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.error.as_deref(), Some("Field Users is a required field"));
}

#[tokio::test]
async fn duplicate_chat_name_is_a_conflict() {
    let (app, tokens) = seeded().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/chats/add",
        Some(&tokens[0]),
        json!({ "chat_name": "friends", "users": [1, 3] }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body.error.as_deref(), Some("Chat already exists"));
}

#[tokio::test]
async fn messages_are_gated_by_membership() {
    let (app, tokens) = seeded().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/messages/add",
        Some(&tokens[0]),
        json!({ "chat_id": 1, "user_id": 1, "text": "hello" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.message.as_deref(), Some("Message created successfully, id: 1"));

    // Outsider cannot post
    let (status, body) = call(
        &app,
        Method::POST,
        "/messages/add",
        Some(&tokens[2]),
        json!({ "chat_id": 1, "user_id": 3, "text": "hi" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body.error.as_deref(), Some("Failed to create message: Invalid chat_id"));

    // Outsider cannot read
    let get = json!({ "chat_id": 1, "limit": 10, "offset": 0 });
    let (status, body) =
        call(&app, Method::POST, "/messages/get", Some(&tokens[2]), get.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body.error.as_deref(),
        Some("User with userID 3 does not exist in chatID 1")
    );

    let (status, body) = call(&app, Method::POST, "/messages/get", Some(&tokens[1]), get).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.message.as_deref(), Some("Message get successfully"));
    let messages = body.messages_list.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "hello");
    assert_eq!(messages[0].user_id, 1);
}

#[tokio::test]
async fn only_the_author_updates_a_message() {
    let (app, tokens) = seeded().await;
    call(
        &app,
        Method::POST,
        "/messages/add",
        Some(&tokens[0]),
        json!({ "chat_id": 1, "user_id": 1, "text": "original" }),
    )
    .await;

    // Boris edits Andrey's message under his own identity
    let (status, body) = call(
        &app,
        Method::PUT,
        "/messages/update",
        Some(&tokens[1]),
        json!({ "message_id": 1, "user_id": 2, "new_text": "hijacked" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body.error.as_deref(), Some("Invalid message_id OR user_id"));

    // Boris claims to be Andrey
    let (status, body) = call(
        &app,
        Method::PUT,
        "/messages/update",
        Some(&tokens[1]),
        json!({ "message_id": 1, "user_id": 1, "new_text": "hijacked" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body.error.as_deref(), Some("Invalid user ID"));

    let get = json!({ "chat_id": 1, "limit": 10, "offset": 0 });
    let (_, body) = call(&app, Method::POST, "/messages/get", Some(&tokens[0]), get).await;
    assert_eq!(body.messages_list.unwrap()[0].text, "original");

    let (status, body) = call(
        &app,
        Method::PUT,
        "/messages/update",
        Some(&tokens[0]),
        json!({ "message_id": 1, "user_id": 1, "new_text": "edited" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.message.as_deref(), Some("Message update successfully, id: 1"));
}

#[tokio::test]
async fn batch_deletes_report_every_id() {
    let (app, tokens) = seeded().await;
    for (token, user_id) in [(&tokens[0], 1), (&tokens[1], 2)] {
        call(
            &app,
            Method::POST,
            "/messages/add",
            Some(token),
            json!({ "chat_id": 1, "user_id": user_id, "text": "hey" }),
        )
        .await;
    }

    let (status, body) = call(
        &app,
        Method::DELETE,
        "/messages/delete",
        Some(&tokens[0]),
        json!({ "message_ids": [1, 2] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.message.as_deref(), Some("Result of deleted messages"));
    let results = body.del_msg_list.unwrap();
    assert_eq!(results[0].message_id, 1);
    assert_eq!(results[0].result, "Message successfully deleted");
    assert_eq!(results[1].message_id, 2);
    assert_eq!(results[1].result, "Message does not exist or has already been deleted");

    // Carol is not a member, Andrey is
    let (_, body) = call(
        &app,
        Method::DELETE,
        "/chats/delete",
        Some(&tokens[2]),
        json!({ "chat_ids": [1] }),
    )
    .await;
    assert_eq!(
        body.del_chats_list.unwrap()[0].result,
        "Chat does not exist or has already been deleted"
    );

    let (status, body) = call(
        &app,
        Method::DELETE,
        "/chats/delete",
        Some(&tokens[0]),
        json!({ "chat_ids": [1] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.message.as_deref(), Some("Result of deleted chats"));
    assert_eq!(body.del_chats_list.unwrap()[0].result, "Chat successfully deleted");

    let (_, body) =
        call(&app, Method::POST, "/chats/get", Some(&tokens[1]), json!({ "user_id": 2 })).await;
    assert_eq!(body.message.as_deref(), Some("User has no chats"));
}
