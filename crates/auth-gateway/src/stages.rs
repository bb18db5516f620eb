//! Bearer token stage

use std::sync::Arc;

use session_auth::{CredentialKey, CredentialStore};
use tracing::warn;
use transport::{RequestDescriptor, RequestStage};

/// Attaches `Authorization: Bearer <access token>` when one is stored.
///
/// The token is read at dispatch time, never cached, so a renewal finished
/// by another request is picked up by the next one. Without a stored token
/// the request goes out unchanged.
pub struct BearerAuth {
    store: Arc<CredentialStore>,
}

impl BearerAuth {
    pub fn new(store: Arc<CredentialStore>) -> Self {
        Self { store }
    }
}

impl RequestStage for BearerAuth {
    fn name(&self) -> &str {
        "bearer-auth"
    }

    fn apply(&self, request: &mut RequestDescriptor) {
        let Some(token) = self.store.get(CredentialKey::AccessToken) else {
            return;
        };
        if let Err(e) = request.set_bearer_token(&token) {
            warn!(request_id = %request.id, error = %e, "stored access token is not a valid header value");
        }
    }
}
