mod config;
mod logging;

use std::sync::Arc;

use axum::http::HeaderName;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use chat_api::AppStateInner;
use chat_api::token::TokenService;
use chat_crypto::SecretCipher;
use chat_db::Database;

use config::Config;

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    logging::init(config.env);

    if config.jwt_secret_is_default {
        warn!("CHAT_JWT_SECRET is not set, using the development signing key");
    }

    // The key is checked again on every cipher call
    let cipher = SecretCipher::new(config.cipher_key.as_str());
    if let Err(e) = cipher.check_key() {
        warn!("CHAT_SECRET is unusable, sign-up and sign-in will fail: {}", e);
    }

    let db = Arc::new(Database::open(&config.db_path)?);
    let tokens = TokenService::new(config.jwt_secret.as_bytes(), config.token_ttl_secs);
    let state = AppStateInner::new(db, cipher, tokens);

    // Layers run bottom-up: the request id is assigned before tracing sees it
    let app = chat_api::router(state)
        .layer(CatchPanicLayer::new())
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::new(REQUEST_ID))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(REQUEST_ID, MakeRequestUuid));

    info!("Chat server listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
