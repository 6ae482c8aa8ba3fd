pub mod auth;
pub mod chats;
pub mod error;
pub mod extract;
pub mod messages;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod token;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, AppStateInner};

use tracing::error;

/// Runs a synchronous store call off the async runtime.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal("internal error".to_string())
    })?
}
