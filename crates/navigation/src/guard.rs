//! Route guard
//!
//! Evaluated before every transition. Reads logged-in state from the
//! credential store and never writes to it.

use std::sync::Arc;

use session_auth::CredentialStore;
use tracing::debug;

use crate::routes::{ResolvedRoute, normalize};

/// Outcome of evaluating a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectTo(String),
}

/// One navigation attempt.
#[derive(Debug, Clone)]
pub struct NavigationIntent {
    pub to: ResolvedRoute,
    pub from: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GuardConfig {
    pub login_path: String,
    /// Where logged-in users land when they try to open the login route
    pub landing_path: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            landing_path: "/".to_string(),
        }
    }
}

pub struct RouteGuard {
    store: Arc<CredentialStore>,
    config: GuardConfig,
}

impl RouteGuard {
    pub fn new(store: Arc<CredentialStore>, config: GuardConfig) -> Self {
        Self { store, config }
    }

    pub fn login_path(&self) -> &str {
        &self.config.login_path
    }

    pub fn landing_path(&self) -> &str {
        &self.config.landing_path
    }

    pub fn decide(&self, intent: &NavigationIntent) -> GuardDecision {
        let requires_auth = intent.to.meta.requires_auth;
        let logged_in = self.store.is_logged_in();
        let to_login = intent.to.path == normalize(&self.config.login_path);

        let decision = if requires_auth && !logged_in {
            GuardDecision::RedirectTo(self.config.login_path.clone())
        } else if to_login && logged_in {
            GuardDecision::RedirectTo(self.config.landing_path.clone())
        } else {
            GuardDecision::Allow
        };

        debug!(
            to = %intent.to.path,
            from = ?intent.from,
            requires_auth,
            logged_in,
            ?decision,
            "route guard evaluated"
        );
        decision
    }
}
