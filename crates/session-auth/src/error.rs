//! Error types for credential storage and token endpoint calls

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The token endpoint rejected the credentials (401/403).
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Any other non-2xx from the token endpoint.
    #[error("token endpoint returned {status}: {body}")]
    TokenEndpoint { status: u16, body: String },

    #[error("invalid token response: {0}")]
    TokenParse(String),

    #[error("credential parse error: {0}")]
    CredentialParse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;
