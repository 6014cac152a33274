//! Request verification: signature, API key, and action validation.
//!
//! Implements the trust checks applied to every inbound webhook before
//! dispatch. Checks are independent and fail-fast; the handler applies
//! them in a fixed order (signature, then API key, then action) and
//! returns the first failure.

use std::str::FromStr;

use axum::http::HeaderMap;

use crate::{
    crypto::{expected_signature, timing_safe_eq},
    error::WebhookError,
};

/// Header naming the calling platform instance.
pub const HEADER_PLATFORM: &str = "x-kapost-platform";
/// Header naming the requested action.
pub const HEADER_ACTION: &str = "x-kapost-action";
/// Header carrying the HMAC signature of the request.
pub const HEADER_SIGNATURE: &str = "x-kapost-signature";

/// Process-wide secrets used to authenticate callers.
///
/// Loaded once at startup from configuration and shared behind an `Arc`
/// across request tasks. Both values are read-only after construction,
/// so unrestricted concurrent reads are safe without locking.
#[derive(Debug, Clone)]
pub struct Credentials {
    signature_secret: String,
    api_key: String,
}

impl Credentials {
    /// Creates credentials from the configured secret pair.
    pub fn new(signature_secret: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self { signature_secret: signature_secret.into(), api_key: api_key.into() }
    }

    /// Shared secret keying the request signature HMAC.
    pub fn signature_secret(&self) -> &str {
        &self.signature_secret
    }

    /// Bearer token the caller must present in `Authorization`.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

/// The set of actions the connector supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Capability handshake from the platform app center.
    Auth,
    /// Publish a piece of content.
    Publish,
    /// Republish previously published content.
    Republish,
}

impl Action {
    /// Canonical wire name of the action.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Publish => "publish",
            Self::Republish => "republish",
        }
    }
}

impl FromStr for Action {
    type Err = WebhookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auth" => Ok(Self::Auth),
            "publish" => Ok(Self::Publish),
            "republish" => Ok(Self::Republish),
            _ => Err(WebhookError::UnsupportedAction),
        }
    }
}

/// The three signature headers a signed request must carry.
///
/// All three must be present simultaneously; a request missing any one
/// is rejected before the HMAC is even computed.
struct SignatureContext<'a> {
    platform: &'a str,
    action: &'a str,
    signature: &'a str,
}

impl<'a> SignatureContext<'a> {
    fn from_headers(headers: &'a HeaderMap) -> Option<Self> {
        let platform = header_value(headers, HEADER_PLATFORM)?;
        let action = header_value(headers, HEADER_ACTION)?;
        let signature = header_value(headers, HEADER_SIGNATURE)?;
        Some(Self { platform, action, signature })
    }
}

/// Optional single-valued header lookup.
///
/// `HeaderMap` is multi-valued; we take the first value, matching how
/// the platform sends these headers.
fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Verifies the request signature against the shared secret.
///
/// The expected value is `sha256=<hex>` of an HMAC-SHA256 over
/// `platform + action + body`. Comparison is constant-time; a signature
/// with the right digest but no `sha256=` prefix does not match.
///
/// # Errors
///
/// Returns `WebhookError::InvalidSignature` if any signature header is
/// missing or the presented value does not match.
pub fn verify_signature(
    headers: &HeaderMap,
    body: &[u8],
    secret: &str,
) -> Result<(), WebhookError> {
    let context =
        SignatureContext::from_headers(headers).ok_or(WebhookError::InvalidSignature)?;

    let expected = expected_signature(secret, context.platform, context.action, body)?;

    if timing_safe_eq(&expected, context.signature) {
        Ok(())
    } else {
        Err(WebhookError::InvalidSignature)
    }
}

/// Verifies the bearer API key in the `Authorization` header.
///
/// # Errors
///
/// Returns `WebhookError::InvalidApiKey` if the header is missing or
/// the presented key does not match the configured one.
pub fn verify_api_key(headers: &HeaderMap, api_key: &str) -> Result<(), WebhookError> {
    let authorization =
        header_value(headers, "authorization").ok_or(WebhookError::InvalidApiKey)?;

    let presented = strip_bearer(authorization);

    if timing_safe_eq(presented, api_key) {
        Ok(())
    } else {
        Err(WebhookError::InvalidApiKey)
    }
}

/// Strips a leading `Bearer` token, case-insensitively, with any amount
/// of whitespace after it.
///
/// A value without the prefix is returned unchanged and compared as the
/// key itself; the upstream contract treats the prefix as optional.
fn strip_bearer(value: &str) -> &str {
    const BEARER: &str = "Bearer";

    if value.len() > BEARER.len() && value[..BEARER.len()].eq_ignore_ascii_case(BEARER) {
        let rest = &value[BEARER.len()..];
        if rest.starts_with(|c: char| c.is_ascii_whitespace()) {
            return rest.trim_start();
        }
    }
    value
}

/// Parses the `X-Kapost-Action` header into a supported action.
///
/// # Errors
///
/// Returns `WebhookError::UnsupportedAction` if the header is missing
/// or names anything other than auth, publish, or republish.
pub fn verify_action(headers: &HeaderMap) -> Result<Action, WebhookError> {
    header_value(headers, HEADER_ACTION)
        .ok_or(WebhookError::UnsupportedAction)?
        .parse()
}
