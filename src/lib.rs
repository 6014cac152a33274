//! Kapost connector webhook service.
//!
//! Receives signed webhook requests from the Kapost content platform,
//! verifies them (HMAC-SHA256 signature, bearer API key, supported
//! action) and dispatches to the per-action response logic.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod server;
pub mod verify;

pub use config::Config;
pub use server::{create_router, start_server};
pub use verify::Credentials;
