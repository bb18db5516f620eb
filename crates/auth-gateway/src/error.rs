//! Error types for credential renewal

/// Why a renewal did not produce a new access token.
///
/// `Clone` because one outcome is shared by every request waiting on the
/// same in-flight renewal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenewalError {
    #[error("no refresh token stored")]
    MissingRefreshToken,

    #[error("refresh token rejected: {0}")]
    Rejected(String),

    #[error("refresh endpoint returned {status}")]
    Endpoint { status: u16 },

    #[error("refresh request failed: {0}")]
    Network(String),

    #[error("invalid refresh response: {0}")]
    InvalidResponse(String),
}

impl From<session_auth::Error> for RenewalError {
    fn from(e: session_auth::Error) -> Self {
        match e {
            session_auth::Error::InvalidCredentials(msg) => RenewalError::Rejected(msg),
            session_auth::Error::TokenEndpoint { status, .. } => RenewalError::Endpoint { status },
            session_auth::Error::Http(msg) => RenewalError::Network(msg),
            other => RenewalError::InvalidResponse(other.to_string()),
        }
    }
}

/// Result alias for renewal operations.
pub type Result<T> = std::result::Result<T, RenewalError>;
