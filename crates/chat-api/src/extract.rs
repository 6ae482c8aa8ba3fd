use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use tracing::warn;
use validator::Validate;

use chat_types::validate::{RequestFields, describe};

use crate::error::ApiError;

/// JSON body that has been decoded and validated. An empty body, undecodable
/// JSON and field violations each produce their own message.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + RequestFields,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|_| ApiError::Validation("Invalid request".to_string()))?;

        if body.is_empty() {
            warn!("request body is empty");
            return Err(ApiError::Validation("Empty request".to_string()));
        }

        let value: T = serde_json::from_slice(&body).map_err(|e| {
            warn!("failed to decode request body: {}", e);
            ApiError::Validation("Invalid request".to_string())
        })?;

        value.validate().map_err(|errors| {
            warn!("invalid request data");
            ApiError::Validation(describe::<T>(&errors))
        })?;

        Ok(ValidJson(value))
    }
}
