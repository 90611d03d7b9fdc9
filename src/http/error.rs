//! Mapping of handler failures onto HTTP responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::provider::ProviderError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Unusable request body; answered with 400 and a JSON reason.
    #[error("{0}")]
    BadRequest(String),

    /// Provider failure; answered with an opaque 500.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(reason) => {
                tracing::warn!(reason = %reason, "Rejected malformed request");
                (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "error": reason })),
                )
                    .into_response()
            }
            ApiError::Provider(e) => {
                tracing::error!(error = %e, "Provider call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_provider_errors_are_opaque() {
        let err = ApiError::from(ProviderError::Decode("secret detail".to_string()));
        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Internal Server Error");
    }

    #[tokio::test]
    async fn test_bad_request_carries_reason() {
        let res = ApiError::BadRequest("missing field `length`".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "missing field `length`");
    }
}
