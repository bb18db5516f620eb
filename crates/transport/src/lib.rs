//! Transport abstraction for outgoing API calls
//!
//! Defines the `Transport` trait that decouples callers from the HTTP client.
//! `ReqwestTransport` is the production implementation; the authenticated
//! gateway implements the same trait as a decorator, so anything that can send
//! through the base transport can send through the gateway unchanged.
//!
//! Requests are plain data (`RequestDescriptor`) so they can be replayed after
//! a credential renewal. Request-side interception is modelled as an ordered
//! list of `RequestStage`s applied before dispatch.

pub mod client;
pub mod request;
pub mod response;
pub mod stages;

pub use client::ReqwestTransport;
pub use request::{Body, Part, PartKind, RequestDescriptor};
pub use response::Response;
pub use stages::{ContentTypeStage, HeaderInjection, RequestStage, StaticHeaders, apply_stages};

pub use reqwest::header;
pub use reqwest::{Method, StatusCode};

use std::future::Future;
use std::pin::Pin;

/// Maximum length for response bodies embedded in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Errors surfaced to callers of a `Transport`.
///
/// `Clone` so a single outcome can be handed to every caller waiting on a
/// shared operation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// No response was received (connect failure, timeout, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The descriptor could not be turned into a request (bad URL, header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The response body could not be decoded.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Credentials were rejected and could not be renewed. The session has
    /// been cleared and the user sent back to the login route.
    #[error("authentication required ({status}): {reason}")]
    Unauthenticated { status: u16, reason: String },

    /// Non-2xx response, produced by `Response::error_for_status`.
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },
}

impl Error {
    /// Build a `Status` error, truncating the body to keep log lines bounded.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        Error::Status {
            status: status.as_u16(),
            body: truncate_body(body),
        }
    }

    /// Whether this error ended the session.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Error::Unauthenticated { .. })
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Sends a request and resolves to the response.
///
/// Any HTTP status is an `Ok` response at this layer; only the absence of a
/// response (or a descriptor that cannot be sent) is an error. Decorators may
/// narrow this, as the authenticated gateway does for terminal auth failures.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn Transport>`).
pub trait Transport: Send + Sync {
    fn send<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> Pin<Box<dyn Future<Output = Result<Response>> + Send + 'a>>;
}
