//! Single-flight access token renewal
//!
//! Requests that fail with 401 while a renewal is already running join it
//! instead of starting their own: the first caller stores a `Shared` future in
//! the slot, later callers clone it, and everyone receives the same outcome.
//! The slot is emptied when the renewal completes, so the next expiry starts
//! a fresh one.
//!
//! A request whose token is no longer the stored one was sent before another
//! renewal finished; it is handed the stored token without a refresh call.

use std::sync::{Arc, Mutex, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use session_auth::{CredentialKey, CredentialStore};
use tracing::{debug, info, warn};
use transport::Transport;
use transport::header::HeaderValue;

use crate::error::{RenewalError, Result};

type SharedRenewal = Shared<BoxFuture<'static, Result<String>>>;

/// How a caller obtained its token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewalKind {
    /// This caller issued the refresh call
    Started,
    /// Another caller's refresh call was already in flight
    Joined,
    /// The stored token had already been renewed; no refresh call
    Reused,
}

impl RenewalKind {
    /// Label for metrics.
    pub fn label(self) -> &'static str {
        match self {
            RenewalKind::Started => "success",
            RenewalKind::Joined => "joined",
            RenewalKind::Reused => "reused",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Renewal {
    pub token: String,
    pub kind: RenewalKind,
}

pub struct Renewer {
    transport: Arc<dyn Transport>,
    store: Arc<CredentialStore>,
    endpoint: String,
    inflight: Mutex<Option<SharedRenewal>>,
}

impl Renewer {
    /// `transport` must be the un-intercepted base transport.
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<CredentialStore>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            store,
            endpoint: endpoint.into(),
            inflight: Mutex::new(None),
        }
    }

    /// Whether a refresh call is currently outstanding.
    pub fn in_flight(&self) -> bool {
        self.inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Obtain a usable access token after a 401.
    ///
    /// `sent_with` is the token the failed request carried, if any.
    pub async fn renew(&self, sent_with: Option<&str>) -> Result<Renewal> {
        if let (Some(sent), Some(current)) =
            (sent_with, self.store.get(CredentialKey::AccessToken))
            && sent != current
        {
            debug!("access token already renewed since dispatch, reusing");
            return Ok(Renewal {
                token: current,
                kind: RenewalKind::Reused,
            });
        }

        let (renewal, kind) = self.join_or_start();
        let outcome = renewal.clone().await;
        self.finish(&renewal);
        outcome.map(|token| Renewal { token, kind })
    }

    fn join_or_start(&self) -> (SharedRenewal, RenewalKind) {
        let mut slot = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = slot.as_ref() {
            debug!("joining in-flight token renewal");
            return (existing.clone(), RenewalKind::Joined);
        }
        let renewal = renew_once(
            self.transport.clone(),
            self.store.clone(),
            self.endpoint.clone(),
        )
        .boxed()
        .shared();
        *slot = Some(renewal.clone());
        (renewal, RenewalKind::Started)
    }

    fn finish(&self, renewal: &SharedRenewal) {
        let mut slot = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|current| current.ptr_eq(renewal)) {
            *slot = None;
        }
    }
}

/// One refresh call. The refresh token is left as is; only the access token
/// is replaced.
async fn renew_once(
    transport: Arc<dyn Transport>,
    store: Arc<CredentialStore>,
    endpoint: String,
) -> Result<String> {
    let Some(refresh) = store.get(CredentialKey::RefreshToken) else {
        warn!("access token expired and no refresh token stored");
        return Err(RenewalError::MissingRefreshToken);
    };

    let response = session_auth::refresh_access_token(transport.as_ref(), &endpoint, &refresh)
        .await
        .map_err(|e| {
            warn!(error = %e, "token refresh failed");
            RenewalError::from(e)
        })?;

    validate_access_token(&response.access)?;
    if let Err(e) = store.set(CredentialKey::AccessToken, &response.access) {
        warn!(error = %e, "failed to persist renewed access token");
    }
    info!("access token renewed");
    Ok(response.access)
}

/// The token must be usable as a bearer header before it is stored.
fn validate_access_token(token: &str) -> Result<()> {
    if token.is_empty() {
        warn!("refresh endpoint returned an empty access token");
        return Err(RenewalError::InvalidResponse("empty access token".to_string()));
    }
    HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
        warn!(error = %e, "refresh endpoint returned an unusable access token");
        RenewalError::InvalidResponse(format!("access token is not a valid header value: {e}"))
    })?;
    Ok(())
}
