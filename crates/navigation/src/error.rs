//! Error types for navigation

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("no route matches {0}")]
    NotFound(String),

    /// Guard redirects did not settle within `MAX_REDIRECTS` hops.
    #[error("redirect loop while navigating to {0}")]
    RedirectLoop(String),
}

/// Result alias for navigation operations.
pub type Result<T> = std::result::Result<T, NavigationError>;
