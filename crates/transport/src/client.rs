//! `reqwest`-backed transport.
//!
//! Resolves relative descriptor URLs against a base URL, encodes the body and
//! buffers the response. The caller-supplied headers are applied before the
//! body so the client can add the multipart boundary itself.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part as FormPart};
use tracing::debug;

use crate::request::{Body, PartKind, RequestDescriptor};
use crate::response::Response;
use crate::{Error, Result, Transport};

pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl ReqwestTransport {
    /// `base_url` should end with `/` so relative paths nest beneath it.
    pub fn new(client: reqwest::Client, base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::InvalidRequest(format!("invalid base url {base_url}: {e}")))?;
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// Absolute URLs are used as-is; anything else is joined onto the base.
    pub fn resolve(&self, url: &str) -> Result<Url> {
        self.base_url
            .join(url)
            .map_err(|e| Error::InvalidRequest(format!("invalid url {url}: {e}")))
    }

    fn build(&self, request: &RequestDescriptor) -> Result<reqwest::RequestBuilder> {
        let url = self.resolve(&request.url)?;
        let builder = self
            .client
            .request(request.method.clone(), url)
            .timeout(self.timeout)
            .headers(request.headers.clone());

        let builder = match &request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(value),
            Body::Bytes { content_type, data } => {
                let builder = match content_type {
                    Some(ct) if !request.headers.contains_key(CONTENT_TYPE) => {
                        builder.header(CONTENT_TYPE, ct.as_str())
                    }
                    _ => builder,
                };
                builder.body(data.clone())
            }
            Body::Multipart(parts) => {
                let mut form = Form::new();
                for part in parts {
                    form = match &part.kind {
                        PartKind::Text(value) => form.text(part.name.clone(), value.clone()),
                        PartKind::File {
                            file_name,
                            mime,
                            data,
                        } => {
                            let mut file = FormPart::bytes(data.to_vec()).file_name(file_name.clone());
                            if let Some(mime) = mime {
                                file = file.mime_str(mime).map_err(|e| {
                                    Error::InvalidRequest(format!(
                                        "invalid mime type for part {}: {e}",
                                        part.name
                                    ))
                                })?;
                            }
                            form.part(part.name.clone(), file)
                        }
                    };
                }
                builder.multipart(form)
            }
        };
        Ok(builder)
    }
}

impl Transport for ReqwestTransport {
    fn send<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> Pin<Box<dyn Future<Output = Result<Response>> + Send + 'a>> {
        Box::pin(async move {
            let builder = self.build(request)?;
            let response = builder.send().await.map_err(map_reqwest_error)?;

            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(map_reqwest_error)?;

            debug!(
                request_id = %request.id,
                method = %request.method,
                url = %request.url,
                status = status.as_u16(),
                "response received"
            );

            Ok(Response {
                status,
                headers,
                body,
            })
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> Error {
    if e.is_builder() {
        Error::InvalidRequest(e.to_string())
    } else if e.is_timeout() {
        Error::Network(format!("request timed out: {e}"))
    } else {
        Error::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> ReqwestTransport {
        ReqwestTransport::new(reqwest::Client::new(), base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn relative_paths_nest_under_base() {
        let t = transport("http://127.0.0.1:8000/api/");
        assert_eq!(
            t.resolve("cardapio/categorias/").unwrap().as_str(),
            "http://127.0.0.1:8000/api/cardapio/categorias/"
        );
    }

    #[test]
    fn absolute_paths_replace_base_path() {
        let t = transport("http://127.0.0.1:8000/api/");
        assert_eq!(
            t.resolve("/api/token/refresh/").unwrap().as_str(),
            "http://127.0.0.1:8000/api/token/refresh/"
        );
    }

    #[test]
    fn absolute_urls_are_used_verbatim() {
        let t = transport("http://127.0.0.1:8000/api/");
        assert_eq!(
            t.resolve("https://auth.example.com/token/").unwrap().as_str(),
            "https://auth.example.com/token/"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = ReqwestTransport::new(reqwest::Client::new(), "not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn invalid_mime_is_reported_before_dispatch() {
        let t = transport("http://127.0.0.1:8000/api/");
        let request = RequestDescriptor::post("upload/").multipart(vec![
            crate::request::Part::file("imagem", "x.png", vec![1]).with_mime("not a mime"),
        ]);
        assert!(matches!(t.build(&request), Err(Error::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        // Port 9 (discard) on localhost is closed in test environments
        let t = transport("http://127.0.0.1:9/");
        let result = t.send(&RequestDescriptor::get("items/")).await;
        assert!(matches!(result, Err(Error::Network(_))), "got: {result:?}");
    }
}
