//! Test doubles: a scripted transport backed by a tiny simulated API, and a
//! navigator that records redirects.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use navigation::Navigator;
use serde_json::json;
use transport::{Body, RequestDescriptor, Response, StatusCode, Transport};

pub(crate) const REFRESH_ENDPOINT: &str = "/api/token/refresh/";
pub(crate) const LOGIN_ENDPOINT: &str = "/api/token/";

type Handler = Box<dyn Fn(&RequestDescriptor) -> transport::Result<Response> + Send + Sync>;

/// Records every request, optionally delays some URLs, answers via `handler`.
pub(crate) struct FakeTransport {
    handler: Handler,
    delays: Vec<(String, Duration)>,
    requests: Mutex<Vec<RequestDescriptor>>,
}

impl FakeTransport {
    pub(crate) fn new(
        handler: impl Fn(&RequestDescriptor) -> transport::Result<Response> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            delays: Vec::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn backend(backend: Backend) -> Self {
        Self::new(move |request| backend.handle(request))
    }

    pub(crate) fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.push((url.to_string(), delay));
        self
    }

    pub(crate) fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn requests_to(&self, url: &str) -> Vec<RequestDescriptor> {
        self.requests()
            .into_iter()
            .filter(|r| r.url == url)
            .collect()
    }
}

impl Transport for FakeTransport {
    fn send<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> Pin<Box<dyn Future<Output = transport::Result<Response>> + Send + 'a>> {
        self.requests.lock().unwrap().push(request.clone());
        let delay = self
            .delays
            .iter()
            .find(|(url, _)| *url == request.url)
            .map(|(_, d)| *d);
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            (self.handler)(request)
        })
    }
}

/// Simulated backend with JWT-style semantics.
///
/// Business endpoints answer 200 only for the currently valid access token.
/// The refresh endpoint issues `issued_access` for the accepted refresh token
/// and, unless told otherwise, makes it the valid token.
pub(crate) struct Backend {
    valid_access: Mutex<Option<String>>,
    accepted_refresh: Option<String>,
    issued_access: String,
    honor_issued: bool,
    refresh_status: Option<StatusCode>,
    forbidden: Vec<String>,
}

impl Backend {
    /// Accepts `token` on business endpoints.
    pub(crate) fn accepting(token: &str) -> Self {
        Self {
            valid_access: Mutex::new(Some(token.to_string())),
            accepted_refresh: Some("R1".to_string()),
            issued_access: "A2".to_string(),
            honor_issued: true,
            refresh_status: None,
            forbidden: Vec::new(),
        }
    }

    /// No access token is valid until the refresh endpoint issues one.
    pub(crate) fn expired() -> Self {
        let backend = Self::accepting("");
        *backend.valid_access.lock().unwrap() = None;
        backend
    }

    pub(crate) fn accepting_refresh(mut self, refresh: Option<&str>) -> Self {
        self.accepted_refresh = refresh.map(str::to_owned);
        self
    }

    /// Refresh succeeds but business endpoints keep rejecting the new token.
    pub(crate) fn ignoring_issued_tokens(mut self) -> Self {
        self.honor_issued = false;
        self
    }

    /// Access token handed out by the refresh endpoint.
    pub(crate) fn issuing(mut self, token: &str) -> Self {
        self.issued_access = token.to_string();
        self
    }

    pub(crate) fn refresh_status(mut self, status: StatusCode) -> Self {
        self.refresh_status = Some(status);
        self
    }

    pub(crate) fn forbidding(mut self, url: &str) -> Self {
        self.forbidden.push(url.to_string());
        self
    }

    fn handle(&self, request: &RequestDescriptor) -> transport::Result<Response> {
        if request.url == REFRESH_ENDPOINT {
            return Ok(self.refresh(request));
        }
        if request.url == LOGIN_ENDPOINT {
            return Ok(self.login(request));
        }
        if self.forbidden.contains(&request.url) {
            return Ok(Response::json_body(
                StatusCode::FORBIDDEN,
                &json!({"detail": "You do not have permission to perform this action."}),
            ));
        }

        let valid = self.valid_access.lock().unwrap().clone();
        match (valid, request.bearer_token()) {
            (Some(valid), Some(sent)) if valid == sent => Ok(Response::json_body(
                StatusCode::OK,
                &json!({"url": request.url, "token": sent}),
            )),
            _ => Ok(Response::json_body(
                StatusCode::UNAUTHORIZED,
                &json!({"detail": "Given token not valid for any token type", "code": "token_not_valid"}),
            )),
        }
    }

    fn refresh(&self, request: &RequestDescriptor) -> Response {
        if let Some(status) = self.refresh_status {
            return Response::json_body(status, &json!({"detail": "refresh unavailable"}));
        }
        let presented = match &request.body {
            Body::Json(value) => value.get("refresh").and_then(|r| r.as_str()),
            _ => None,
        };
        match (presented, self.accepted_refresh.as_deref()) {
            (Some(presented), Some(accepted)) if presented == accepted => {
                if self.honor_issued {
                    *self.valid_access.lock().unwrap() = Some(self.issued_access.clone());
                }
                Response::json_body(StatusCode::OK, &json!({"access": self.issued_access}))
            }
            _ => Response::json_body(
                StatusCode::UNAUTHORIZED,
                &json!({"detail": "Token is invalid or expired", "code": "token_not_valid"}),
            ),
        }
    }

    fn login(&self, request: &RequestDescriptor) -> Response {
        let password = match &request.body {
            Body::Json(value) => value.get("password").and_then(|p| p.as_str()),
            _ => None,
        };
        if password == Some("s3cret") {
            *self.valid_access.lock().unwrap() = Some("A1".to_string());
            Response::json_body(StatusCode::OK, &json!({"access": "A1", "refresh": "R1"}))
        } else {
            Response::json_body(
                StatusCode::UNAUTHORIZED,
                &json!({"detail": "No active account found with the given credentials"}),
            )
        }
    }
}

/// Navigator that records every redirect it is asked to perform.
#[derive(Default)]
pub(crate) struct RecordingNavigator {
    current: Mutex<Option<String>>,
    calls: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub(crate) fn at(path: &str) -> Self {
        let nav = Self::default();
        *nav.current.lock().unwrap() = Some(path.to_string());
        nav
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> Option<String> {
        self.current.lock().unwrap().clone()
    }

    fn push(&self, path: &str) -> navigation::Result<String> {
        self.calls.lock().unwrap().push(format!("push {path}"));
        *self.current.lock().unwrap() = Some(path.to_string());
        Ok(path.to_string())
    }

    fn reload(&self, path: &str) -> navigation::Result<String> {
        self.calls.lock().unwrap().push(format!("reload {path}"));
        *self.current.lock().unwrap() = Some(path.to_string());
        Ok(path.to_string())
    }
}
