//! Token endpoint calls
//!
//! Both calls go through whatever `Transport` the caller hands in. The gateway
//! passes its *inner* transport so these requests are never intercepted: a
//! 401 from the refresh endpoint must not start another renewal.

use serde::Deserialize;
use transport::{RequestDescriptor, Response, Transport};

use crate::error::{Error, Result};

/// Response from the refresh endpoint. Only `access` is consumed; the refresh
/// token is not rotated.
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Response from the login endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Exchange a refresh token for a new access token.
pub async fn refresh_access_token(
    transport: &dyn Transport,
    endpoint: &str,
    refresh: &str,
) -> Result<RefreshResponse> {
    let request = RequestDescriptor::post(endpoint).json(serde_json::json!({ "refresh": refresh }));
    let response = transport
        .send(&request)
        .await
        .map_err(|e| Error::Http(format!("token refresh request failed: {e}")))?;

    check_status(&response, "refresh token")?;

    response
        .json::<RefreshResponse>()
        .map_err(|e| Error::TokenParse(format!("invalid refresh response: {e}")))
}

/// Exchange username and password for an access/refresh pair.
pub async fn obtain_token_pair(
    transport: &dyn Transport,
    endpoint: &str,
    username: &str,
    password: &str,
) -> Result<TokenPair> {
    let request = RequestDescriptor::post(endpoint).json(serde_json::json!({
        "username": username,
        "password": password,
    }));
    let response = transport
        .send(&request)
        .await
        .map_err(|e| Error::Http(format!("login request failed: {e}")))?;

    check_status(&response, "login")?;

    response
        .json::<TokenPair>()
        .map_err(|e| Error::TokenParse(format!("invalid login response: {e}")))
}

fn check_status(response: &Response, what: &str) -> Result<()> {
    let status = response.status;
    if status.is_success() {
        return Ok(());
    }
    let body = response.text();
    if status.as_u16() == 401 || status.as_u16() == 403 {
        return Err(Error::InvalidCredentials(format!(
            "{what} rejected ({status}): {body}"
        )));
    }
    Err(Error::TokenEndpoint {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use transport::{Body, StatusCode};

    /// Answers every request with a fixed result and records what it saw.
    struct Canned {
        result: transport::Result<Response>,
        seen: Mutex<Vec<RequestDescriptor>>,
    }

    impl Canned {
        fn new(result: transport::Result<Response>) -> Self {
            Self {
                result,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for Canned {
        fn send<'a>(
            &'a self,
            request: &'a RequestDescriptor,
        ) -> Pin<Box<dyn Future<Output = transport::Result<Response>> + Send + 'a>> {
            self.seen.lock().unwrap().push(request.clone());
            let result = self.result.clone();
            Box::pin(async move { result })
        }
    }

    #[tokio::test]
    async fn refresh_posts_refresh_token() {
        let canned = Canned::new(Ok(Response::json_body(
            StatusCode::OK,
            &serde_json::json!({"access": "A2"}),
        )));

        let response = refresh_access_token(&canned, "/api/token/refresh/", "R1")
            .await
            .unwrap();
        assert_eq!(response.access, "A2");

        let seen = canned.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, transport::Method::POST);
        assert_eq!(seen[0].url, "/api/token/refresh/");
        match &seen[0].body {
            Body::Json(v) => assert_eq!(v, &serde_json::json!({"refresh": "R1"})),
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[tokio::test]
    async fn refresh_ignores_extra_fields() {
        let canned = Canned::new(Ok(Response::json_body(
            StatusCode::OK,
            &serde_json::json!({"access": "A2", "refresh": "R9", "exp": 1}),
        )));
        let response = refresh_access_token(&canned, "/r/", "R1").await.unwrap();
        assert_eq!(response.access, "A2");
    }

    #[tokio::test]
    async fn refresh_rejection_is_invalid_credentials() {
        let canned = Canned::new(Ok(Response::json_body(
            StatusCode::UNAUTHORIZED,
            &serde_json::json!({"detail": "Token is invalid or expired", "code": "token_not_valid"}),
        )));
        let err = refresh_access_token(&canned, "/r/", "R1").await.unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials(ref m) if m.contains("token_not_valid")));
    }

    #[tokio::test]
    async fn refresh_server_error_is_endpoint_error() {
        let canned = Canned::new(Ok(Response::new(StatusCode::BAD_GATEWAY, "upstream down")));
        let err = refresh_access_token(&canned, "/r/", "R1").await.unwrap_err();
        assert!(matches!(err, Error::TokenEndpoint { status: 502, .. }));
    }

    #[tokio::test]
    async fn refresh_network_error_is_http_error() {
        let canned = Canned::new(Err(transport::Error::Network("connection refused".into())));
        let err = refresh_access_token(&canned, "/r/", "R1").await.unwrap_err();
        assert!(matches!(err, Error::Http(ref m) if m.contains("connection refused")));
    }

    #[tokio::test]
    async fn refresh_without_access_field_is_parse_error() {
        let canned = Canned::new(Ok(Response::json_body(
            StatusCode::OK,
            &serde_json::json!({"token": "A2"}),
        )));
        let err = refresh_access_token(&canned, "/r/", "R1").await.unwrap_err();
        assert!(matches!(err, Error::TokenParse(_)));
    }

    #[tokio::test]
    async fn login_returns_pair() {
        let canned = Canned::new(Ok(Response::json_body(
            StatusCode::OK,
            &serde_json::json!({"access": "A1", "refresh": "R1"}),
        )));
        let pair = obtain_token_pair(&canned, "/api/token/", "garcom", "s3cret")
            .await
            .unwrap();
        assert_eq!(pair.access, "A1");
        assert_eq!(pair.refresh, "R1");

        let seen = canned.seen.lock().unwrap();
        match &seen[0].body {
            Body::Json(v) => {
                assert_eq!(v["username"], "garcom");
                assert_eq!(v["password"], "s3cret");
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[tokio::test]
    async fn login_with_bad_password_is_invalid_credentials() {
        let canned = Canned::new(Ok(Response::json_body(
            StatusCode::UNAUTHORIZED,
            &serde_json::json!({"detail": "No active account found with the given credentials"}),
        )));
        let err = obtain_token_pair(&canned, "/api/token/", "garcom", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials(_)));
    }
}
