//! Buffered response

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Convenience for fakes and tests: a response with a JSON body.
    pub fn json_body(status: StatusCode, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| Error::Decode(e.to_string()))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Turn a non-2xx response into `Error::Status`.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::from_status(self.status, &self.text()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Item {
        id: u32,
        nome: String,
    }

    #[test]
    fn decodes_json_body() {
        let response = Response::json_body(
            StatusCode::OK,
            &serde_json::json!({"id": 7, "nome": "Suco"}),
        );
        let item: Item = response.json().unwrap();
        assert_eq!(item.id, 7);
        assert_eq!(item.nome, "Suco");
    }

    #[test]
    fn decode_failure_is_reported() {
        let response = Response::new(StatusCode::OK, "<html>");
        let err = response.json::<Item>().unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn error_for_status_passes_success_through() {
        let response = Response::new(StatusCode::CREATED, "{}");
        assert_eq!(response.error_for_status().unwrap().status, StatusCode::CREATED);
    }

    #[test]
    fn error_for_status_rejects_non_success() {
        let response = Response::new(StatusCode::BAD_REQUEST, r#"{"nome":["required"]}"#);
        match response.error_for_status().unwrap_err() {
            Error::Status { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("required"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
