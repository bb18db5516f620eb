//! Wiring: one credential store shared by the router's guard and the
//! authenticated transport, which redirects through the router.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use auth_gateway::AuthenticatedTransport;
use navigation::{RouteGuard, Router};
use session_auth::CredentialStore;
use tracing::info;
use transport::{ReqwestTransport, Transport};

use crate::config::Config;

pub struct App {
    pub gateway: AuthenticatedTransport,
    pub router: Arc<Router>,
    pub store: Arc<CredentialStore>,
}

impl App {
    pub fn build(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("failed to build HTTP client")?;
        let base = ReqwestTransport::new(
            client,
            &config.api.base_url,
            Duration::from_secs(config.api.timeout_secs),
        )
        .context("invalid api.base_url")?;
        let store = Arc::new(CredentialStore::open(config.session.store_path.clone()));
        Ok(Self::with_transport(config, Arc::new(base), store))
    }

    /// Assemble the stack over an arbitrary base transport.
    pub fn with_transport(
        config: &Config,
        inner: Arc<dyn Transport>,
        store: Arc<CredentialStore>,
    ) -> Self {
        let guard = RouteGuard::new(store.clone(), config.guard_config());
        let router = Arc::new(Router::new(config.route_table(), guard));
        let gateway = AuthenticatedTransport::new(
            inner,
            store.clone(),
            router.clone(),
            config.gateway_options(),
        );
        info!(
            routes = config.routes.len(),
            headers = config.headers.len(),
            logged_in = store.is_logged_in(),
            "authgate ready"
        );
        Self {
            gateway,
            router,
            store,
        }
    }
}
