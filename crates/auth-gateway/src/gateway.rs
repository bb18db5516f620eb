//! Authenticated transport
//!
//! Decorates a base `Transport`: every request goes through the stage list
//! (static headers, content type, bearer token), then the response drives the
//! per-request state machine in `state`. A 401 triggers a shared renewal and
//! one replay; any terminal outcome clears the session and sends the user to
//! the login route before the caller sees `Error::Unauthenticated`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use navigation::{Navigator, RedirectStrategy};
use session_auth::{CredentialStore, DEFAULT_LOGIN_PATH, DEFAULT_REFRESH_PATH};
use tracing::{debug, warn};
use transport::{
    ContentTypeStage, HeaderInjection, RequestDescriptor, RequestStage, Response, StaticHeaders,
    Transport, apply_stages,
};

use crate::metrics;
use crate::renewal::Renewer;
use crate::stages::BearerAuth;
use crate::state::{RequestAction, RequestEvent, RequestState, handle_event};

#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Token refresh endpoint, relative to the base transport
    pub refresh_endpoint: String,
    /// Username/password login endpoint
    pub login_endpoint: String,
    /// Route the user is sent to when the session ends
    pub login_route: String,
    pub redirect: RedirectStrategy,
    /// Extra headers added to every request
    pub headers: Vec<HeaderInjection>,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            refresh_endpoint: DEFAULT_REFRESH_PATH.to_string(),
            login_endpoint: DEFAULT_LOGIN_PATH.to_string(),
            login_route: "/login".to_string(),
            redirect: RedirectStrategy::default(),
            headers: Vec::new(),
        }
    }
}

pub struct AuthenticatedTransport {
    pub(crate) inner: Arc<dyn Transport>,
    pub(crate) store: Arc<CredentialStore>,
    pub(crate) navigator: Arc<dyn Navigator>,
    pub(crate) options: GatewayOptions,
    stages: Vec<Arc<dyn RequestStage>>,
    renewer: Renewer,
}

impl AuthenticatedTransport {
    /// `inner` is used both for business requests and, directly, for the
    /// refresh call, which therefore never passes through this gateway.
    pub fn new(
        inner: Arc<dyn Transport>,
        store: Arc<CredentialStore>,
        navigator: Arc<dyn Navigator>,
        options: GatewayOptions,
    ) -> Self {
        let stages: Vec<Arc<dyn RequestStage>> = vec![
            Arc::new(StaticHeaders::new(options.headers.clone())),
            Arc::new(ContentTypeStage),
            Arc::new(BearerAuth::new(store.clone())),
        ];
        let renewer = Renewer::new(inner.clone(), store.clone(), options.refresh_endpoint.clone());
        Self {
            inner,
            store,
            navigator,
            options,
            stages,
            renewer,
        }
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }

    /// Copy of `request` with every stage applied.
    pub fn prepare(&self, request: &RequestDescriptor) -> RequestDescriptor {
        let mut prepared = request.clone();
        apply_stages(&self.stages, &mut prepared);
        prepared
    }

    /// Send `request`, renewing credentials and replaying at most once.
    ///
    /// Non-auth error statuses come back as `Ok` responses; transport errors
    /// are returned unchanged. `Error::Unauthenticated` means the session has
    /// already been cleared and the login redirect issued.
    pub async fn execute(&self, request: &RequestDescriptor) -> transport::Result<Response> {
        let mut request = self.prepare(request);
        let mut response = self.dispatch(&request).await?;

        let mut state = RequestState::Fresh;
        let mut event = RequestEvent::Responded(response.status.as_u16());
        let mut renewal_error: Option<String> = None;

        loop {
            let (next, action) = handle_event(state, event);
            debug!(
                request_id = %request.id,
                from = ?state,
                to = ?next,
                ?action,
                "request state transition"
            );
            let replayed = state == RequestState::Replayed;
            state = next;

            event = match action {
                RequestAction::Deliver => return Ok(response),
                RequestAction::Renew => {
                    let sent_with = request.bearer_token().map(str::to_owned);
                    match self.renewer.renew(sent_with.as_deref()).await {
                        Ok(renewal) => match request.set_bearer_token(&renewal.token) {
                            Ok(()) => {
                                metrics::record_renewal(renewal.kind.label());
                                RequestEvent::RenewalSucceeded
                            }
                            Err(e) => {
                                metrics::record_renewal("failure");
                                renewal_error = Some(e.to_string());
                                RequestEvent::RenewalFailed
                            }
                        },
                        Err(e) => {
                            metrics::record_renewal("failure");
                            renewal_error = Some(e.to_string());
                            RequestEvent::RenewalFailed
                        }
                    }
                }
                RequestAction::Replay => {
                    debug!(request_id = %request.id, url = %request.url, "replaying with renewed token");
                    response = self.dispatch(&request).await?;
                    RequestEvent::Responded(response.status.as_u16())
                }
                RequestAction::Terminate => {
                    let status = response.status.as_u16();
                    let (label, reason) = match renewal_error.take() {
                        Some(reason) => ("renewal_failed", reason),
                        None if replayed => (
                            "replay_rejected",
                            format!("renewed credentials rejected with {status}"),
                        ),
                        None => ("forbidden", format!("access denied with {status}")),
                    };
                    return Err(self.terminate(&request, status, label, reason));
                }
            };
        }
    }

    async fn dispatch(&self, request: &RequestDescriptor) -> transport::Result<Response> {
        debug!(
            request_id = %request.id,
            method = %request.method,
            url = %request.url,
            authenticated = request.bearer_token().is_some(),
            "dispatching request"
        );
        match self.inner.send(request).await {
            Ok(response) => {
                metrics::record_request(response.status.as_u16());
                Ok(response)
            }
            Err(e) => {
                warn!(request_id = %request.id, url = %request.url, error = %e, "request failed without a response");
                metrics::record_transport_error();
                Err(e)
            }
        }
    }

    fn terminate(
        &self,
        request: &RequestDescriptor,
        status: u16,
        label: &'static str,
        reason: String,
    ) -> transport::Error {
        warn!(
            request_id = %request.id,
            url = %request.url,
            status,
            reason = %reason,
            "authentication failed, ending session"
        );
        metrics::record_termination(label);
        self.end_session();
        transport::Error::Unauthenticated { status, reason }
    }
}

impl Transport for AuthenticatedTransport {
    fn send<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> Pin<Box<dyn Future<Output = transport::Result<Response>> + Send + 'a>> {
        Box::pin(self.execute(request))
    }
}
