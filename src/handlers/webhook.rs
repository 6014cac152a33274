//! Webhook verification pipeline and action dispatch.
//!
//! Every request flows through the same linear pipeline: method check,
//! body read, signature verification, API key verification, action
//! validation, then dispatch. The first failing check aborts the
//! pipeline and its error becomes the response; later checks never run.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{
    error::WebhookError,
    verify::{self, Action, Credentials},
};

/// Upper bound on accepted payload size (10MB).
const MAX_PAYLOAD_SIZE: usize = 10 * 1024 * 1024;

/// External id of the one resource this connector has published.
///
/// Publishing is a stub: it always reports this id, and republish only
/// recognizes it. A real connector would persist publish state.
const KNOWN_EXTERNAL_ID: &str = "abc33";

/// URL reported for a fresh publish.
const PUBLISHED_URL: &str = "https://localhost/bridge-demo";

/// URL reported for a republish of the known resource.
const REPUBLISHED_URL: &str = "https://localhost/bridge-demo-republish";

/// Capability flags returned on the auth handshake.
#[derive(Debug, Serialize)]
pub struct Capabilities {
    /// Caller may send HTML content.
    pub html: bool,
    /// Caller may publish arbitrary file types.
    pub any_file: bool,
}

/// Response envelope for the auth action.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// What this connector supports.
    pub capabilities: Capabilities,
}

/// Published-resource description shared by publish and republish.
#[derive(Debug, Serialize)]
pub struct PublishMetadata {
    /// Opaque identifier naming the published resource.
    pub external_id: String,
    /// Where the published content can be reached.
    pub published_url: String,
}

/// Response envelope for publish and republish actions.
#[derive(Debug, Serialize)]
pub struct PublishResponse {
    /// Metadata of the (re)published resource.
    pub metadata: PublishMetadata,
}

/// Request body for the republish action:
/// `{"action": {"external_id": "..."}}`.
///
/// Every field defaults so a malformed or partial body degrades to an
/// empty external id instead of a parse error; the empty id then fails
/// the match check and yields a 404. Intentional leniency inherited
/// from the platform contract.
#[derive(Debug, Default, Deserialize)]
struct RepublishPayload {
    #[serde(default)]
    action: RepublishAction,
}

#[derive(Debug, Default, Deserialize)]
struct RepublishAction {
    #[serde(default)]
    external_id: String,
}

/// Handles an inbound webhook request from the platform.
///
/// Registered for every method on the endpoint path so that non-POST
/// requests still receive the JSON error envelope rather than a bare
/// 405.
#[instrument(
    name = "webhook",
    skip(credentials, request),
    fields(method = %request.method()),
)]
pub async fn handle_webhook(
    State(credentials): State<Arc<Credentials>>,
    request: Request,
) -> Response {
    match process(&credentials, request).await {
        Ok(response) => response,
        Err(error) => {
            warn!(status = %error.status(), error = %error, "request rejected");
            error.into_response()
        },
    }
}

/// Runs the verification pipeline and dispatches the action.
async fn process(credentials: &Credentials, request: Request) -> Result<Response, WebhookError> {
    if request.method() != Method::POST {
        return Err(WebhookError::UnsupportedMethod);
    }

    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, MAX_PAYLOAD_SIZE)
        .await
        .map_err(|_| WebhookError::BodyReadFailure)?;

    verify::verify_signature(&parts.headers, &body, credentials.signature_secret())?;
    verify::verify_api_key(&parts.headers, credentials.api_key())?;
    let action = verify::verify_action(&parts.headers)?;

    debug!(action = action.as_str(), payload_size = body.len(), "request verified");

    dispatch(action, &body)
}

/// Produces the response envelope for a validated action.
fn dispatch(action: Action, body: &Bytes) -> Result<Response, WebhookError> {
    match action {
        // NOTE: the API key could additionally be validated against the
        // platform app center here and an error returned if revoked.
        Action::Auth => {
            info!("auth handshake, reporting capabilities");
            let response = AuthResponse {
                capabilities: Capabilities { html: true, any_file: true },
            };
            Ok((StatusCode::OK, Json(response)).into_response())
        },
        Action::Publish => {
            info!(external_id = KNOWN_EXTERNAL_ID, "content published");
            Ok(publish_response(PUBLISHED_URL))
        },
        Action::Republish => {
            let payload: RepublishPayload = serde_json::from_slice(body).unwrap_or_default();
            let external_id = payload.action.external_id;

            if external_id != KNOWN_EXTERNAL_ID {
                debug!(external_id = %external_id, "republish target unknown");
                return Err(WebhookError::ResourceNotFound);
            }

            info!(external_id = %external_id, "content republished");
            Ok(publish_response(REPUBLISHED_URL))
        },
    }
}

fn publish_response(url: &str) -> Response {
    let response = PublishResponse {
        metadata: PublishMetadata {
            external_id: KNOWN_EXTERNAL_ID.to_string(),
            published_url: url.to_string(),
        },
    };
    (StatusCode::OK, Json(response)).into_response()
}
