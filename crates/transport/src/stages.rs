//! Request stages: ordered transforms applied to a descriptor before dispatch.
//!
//! Each stage sees only the descriptor (plus whatever it was constructed
//! with), so stages can be tested in isolation and composed in any order.

use std::str::FromStr;
use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue};
use serde::Deserialize;
use tracing::warn;

use crate::request::{Body, RequestDescriptor};

pub trait RequestStage: Send + Sync {
    /// Identifier for logging.
    fn name(&self) -> &str;

    fn apply(&self, request: &mut RequestDescriptor);
}

/// Run `stages` over `request` in order.
pub fn apply_stages(stages: &[Arc<dyn RequestStage>], request: &mut RequestDescriptor) {
    for stage in stages {
        stage.apply(request);
    }
}

/// Header injection rule (name + value pair from config).
#[derive(Debug, Clone, Deserialize)]
pub struct HeaderInjection {
    pub name: String,
    pub value: String,
}

/// Static header injection. Invalid entries are skipped with a warning and
/// `Authorization` is never overwritten, since credentials belong to the
/// bearer stage.
pub struct StaticHeaders {
    headers: Vec<HeaderInjection>,
}

impl StaticHeaders {
    pub fn new(headers: Vec<HeaderInjection>) -> Self {
        Self { headers }
    }
}

impl RequestStage for StaticHeaders {
    fn name(&self) -> &str {
        "static-headers"
    }

    fn apply(&self, request: &mut RequestDescriptor) {
        for injection in &self.headers {
            let name = match HeaderName::from_str(&injection.name) {
                Ok(n) => n,
                Err(e) => {
                    warn!(header = %injection.name, error = %e, "skipping invalid header name");
                    continue;
                }
            };
            if name == AUTHORIZATION {
                warn!(header = %injection.name, "refusing to inject authorization header");
                continue;
            }
            let value = match HeaderValue::from_str(&injection.value) {
                Ok(v) => v,
                Err(e) => {
                    warn!(header = %injection.name, error = %e, "skipping invalid header value");
                    continue;
                }
            };
            request.headers.insert(name, value);
        }
    }
}

/// Content-Type handling.
///
/// JSON bodies default to `application/json`. Multipart bodies must not carry
/// a caller-chosen Content-Type: the boundary parameter is generated by the
/// client when the form is encoded, so any preset value is dropped.
pub struct ContentTypeStage;

impl RequestStage for ContentTypeStage {
    fn name(&self) -> &str {
        "content-type"
    }

    fn apply(&self, request: &mut RequestDescriptor) {
        match request.body {
            Body::Multipart(_) => {
                request.headers.remove(CONTENT_TYPE);
            }
            Body::Json(_) if !request.headers.contains_key(CONTENT_TYPE) => {
                request
                    .headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            _ => {}
        }
    }
}
