//! Error taxonomy for the webhook pipeline.
//!
//! Every failure mode of request verification and dispatch maps to
//! exactly one HTTP status and one message. Errors are terminal for the
//! request; nothing is retried. Messages never echo back signatures,
//! keys, or any other secret material.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failures that abort webhook handling.
///
/// The pipeline evaluates its checks in a fixed order and returns the
/// first failure; variants here mirror those checks plus the one
/// dispatch-level failure (republish target lookup).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// Request used a method other than POST.
    #[error("Unsupported HTTP method")]
    UnsupportedMethod,

    /// Request body could not be read in full.
    #[error("Unexpected error while reading payload")]
    BodyReadFailure,

    /// Signature headers missing or HMAC mismatch.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Authorization header missing or bearer key mismatch.
    #[error("Invalid API Key")]
    InvalidApiKey,

    /// Action header named something other than auth/publish/republish.
    ///
    /// Responds 405 rather than 400; the upstream platform contract
    /// reuses "method not allowed" for unsupported actions.
    #[error("Action is not supported")]
    UnsupportedAction,

    /// Republish referenced an external id we have not published.
    #[error("Cannot republish because external id not found")]
    ResourceNotFound,
}

impl WebhookError {
    /// HTTP status code this error responds with.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::UnsupportedMethod | Self::UnsupportedAction => StatusCode::METHOD_NOT_ALLOWED,
            Self::BodyReadFailure => StatusCode::BAD_REQUEST,
            Self::InvalidSignature => StatusCode::FORBIDDEN,
            Self::InvalidApiKey => StatusCode::UNAUTHORIZED,
            Self::ResourceNotFound => StatusCode::NOT_FOUND,
        }
    }
}

/// JSON error envelope: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable failure description.
    pub error: String,
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.to_string() };
        (self.status(), Json(body)).into_response()
    }
}
