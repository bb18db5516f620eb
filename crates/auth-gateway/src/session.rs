//! Session lifecycle: login, logout and terminal cleanup

use navigation::force_login;
use session_auth::{CredentialBundle, obtain_token_pair};
use tracing::{info, warn};

use crate::gateway::AuthenticatedTransport;

impl AuthenticatedTransport {
    /// Exchange username and password for a token pair and store it.
    ///
    /// Goes through the base transport: a 401 here means wrong credentials,
    /// not an expired session.
    pub async fn login(&self, username: &str, password: &str) -> session_auth::Result<()> {
        let pair = obtain_token_pair(
            self.inner.as_ref(),
            &self.options.login_endpoint,
            username,
            password,
        )
        .await?;
        self.store.store_bundle(&CredentialBundle {
            access_token: pair.access.into(),
            refresh_token: pair.refresh.into(),
            username: Some(username.to_string()),
        })?;
        info!(username, "logged in");
        Ok(())
    }

    /// Explicit logout: forget credentials and return to the login route.
    pub fn logout(&self) -> session_auth::Result<()> {
        self.store.clear_all()?;
        info!("logged out");
        force_login(
            self.navigator.as_ref(),
            &self.options.login_route,
            self.options.redirect,
        );
        Ok(())
    }

    /// Terminal cleanup after an unrecoverable authentication failure.
    ///
    /// Clears every credential key, then redirects to the login route unless
    /// already there. Safe to call repeatedly; returns whether a redirect was
    /// issued. A failure to persist the cleared store is logged: the in-memory
    /// state is already cleared, so the guard sees a logged-out user.
    pub fn end_session(&self) -> bool {
        if let Err(e) = self.store.clear_all() {
            warn!(error = %e, "failed to persist cleared credentials");
        }
        force_login(
            self.navigator.as_ref(),
            &self.options.login_route,
            self.options.redirect,
        )
    }
}
