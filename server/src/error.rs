//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use keymint_engine::EngineError;
use serde_json::json;

/// API-level failures, mapped onto status codes and a `{"error": ...}` body.
#[derive(Debug)]
pub enum ApiError {
    /// An engine decision rejected the request.
    Engine(EngineError),
    /// Admin credential missing or wrong. Deliberately says nothing about
    /// whether the targeted resource exists.
    Unauthorized,
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            Self::Engine(err) => match &err {
                EngineError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                EngineError::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
                EngineError::Expired | EngineError::IdentityMismatch => {
                    (StatusCode::FORBIDDEN, err.to_string())
                }
                EngineError::KeyGeneration(_) | EngineError::Persistence(_) => {
                    // Detail may name file paths; log it, return a generic body.
                    tracing::error!("internal error: {err}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal error".to_string(),
                    )
                }
            },
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
