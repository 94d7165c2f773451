//! Transport - HTTP boundary between providers and the network
//!
//! Requests and responses are fully buffered so a decorator can look at a
//! body without taking it away from the caller. `Bytes` clones are
//! reference-counted.
//!
//! # Module Structure
//!
//! - `reqwest_client`: production transport backed by `reqwest`

mod reqwest_client;

pub use reqwest_client::ReqwestTransport;

use crate::error::{Error, Result};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// An outbound HTTP request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Bytes,
}

impl HttpRequest {
    /// Create a request with an empty body
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Create a `POST` request with a JSON body
    pub fn post_json<T: Serialize + ?Sized>(url: impl Into<String>, body: &T) -> Result<Self> {
        let mut request = Self::new(Method::POST, url);
        request.body = Bytes::from(serde_json::to_vec(body)?);
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(request)
    }

    /// Add a header, rejecting values that are not valid header text
    pub fn with_header(mut self, name: &'static str, value: &str) -> Result<Self> {
        let value = HeaderValue::from_str(value)
            .map_err(|_| Error::NotConfigured(format!("invalid value for header '{}'", name)))?;
        self.headers.insert(HeaderName::from_static(name), value);
        Ok(self)
    }
}

/// A fully buffered HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Bytes,
}

impl HttpResponse {
    /// Create a response
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as lossy UTF-8 text
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

/// Sends buffered HTTP requests
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request and wait for the whole response.
    ///
    /// Implementations return [`Error::Cancelled`] if `cancel` fires before the
    /// response has been read.
    async fn send(&self, request: HttpRequest, cancel: &CancellationToken)
        -> Result<HttpResponse>;
}

#[async_trait::async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn send(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        (**self).send(request, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_json_sets_content_type() {
        let request =
            HttpRequest::post_json("https://example.test/chat", &serde_json::json!({"a": 1}))
                .unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.headers[CONTENT_TYPE], "application/json");
        assert_eq!(&request.body[..], br#"{"a":1}"#);
    }

    #[test]
    fn test_with_header_rejects_newlines() {
        let request = HttpRequest::new(Method::GET, "https://example.test");
        assert!(request.clone().with_header("api-key", "abc").is_ok());
        assert!(matches!(
            request.with_header("api-key", "bad\nvalue"),
            Err(Error::NotConfigured(_))
        ));
    }

    #[test]
    fn test_response_helpers() {
        let response = HttpResponse::new(StatusCode::OK, r#"{"model":"gpt-4o"}"#);
        assert!(response.is_success());
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["model"], "gpt-4o");

        let bad = HttpResponse::new(StatusCode::BAD_GATEWAY, "<html>");
        assert!(!bad.is_success());
        assert_eq!(bad.text(), "<html>");
        assert!(bad.json::<serde_json::Value>().is_err());
    }
}
