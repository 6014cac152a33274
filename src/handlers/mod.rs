//! HTTP request handlers for the connector.
//!
//! A single webhook endpoint handles every request. The handler runs a
//! fixed verification pipeline (method, body, signature, API key,
//! action) and then dispatches on the validated action. All responses
//! are JSON, success and error alike.

pub mod webhook;

pub use webhook::handle_webhook;
