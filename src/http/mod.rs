//! Lightweight HTTP abstraction decoupling providers from the concrete client.
//!
//! Providers build [`HttpRequest`] values and hand them to an [`HttpTransport`];
//! the default implementation lives in [`reqwest`](crate::http::reqwest). Status
//! checking deliberately stays out of this layer: facades inspect the status and
//! keep non-success bodies verbatim for diagnostics.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_core::Stream;
use futures_util::StreamExt;
use serde::Serialize;

use crate::error::Error;

/// HTTP methods understood by the transport abstraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Minimal HTTP request representation shared across providers.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Builds a POST request carrying a JSON body.
    ///
    /// Sets the `Content-Type` header to `application/json` and stores the
    /// provided buffer as the body.
    ///
    /// # Examples
    ///
    /// ```
    /// use hashi::http::{HttpMethod, HttpRequest};
    ///
    /// let request = HttpRequest::post_json("https://example.com", br"{}".to_vec());
    /// assert_eq!(request.method, HttpMethod::Post);
    /// assert_eq!(request.headers.get("Content-Type"), Some(&"application/json".to_string()));
    /// ```
    pub fn post_json(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: HashMap::from([("Content-Type".to_string(), "application/json".to_string())]),
            body: Some(body),
            timeout: None,
        }
    }

    /// Merges additional headers into the request, overriding duplicates.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }
}

/// Fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Converts the body into a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when the body is not valid UTF-8.
    pub fn into_string(self) -> Result<String, Error> {
        String::from_utf8(self.body).map_err(|err| Error::transport(err.to_string()))
    }

    /// Body as a string for diagnostics, replacing invalid UTF-8.
    pub fn body_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP response that carries a streaming body.
pub struct HttpStreamResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: HttpBodyStream,
}

/// Alias for the body stream returned by [`HttpTransport::send_stream`].
pub type HttpBodyStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, Error>> + Send>>;

/// Transport abstraction used to decouple providers from the concrete HTTP client.
///
/// Test suites substitute in-memory implementations that replay canned bodies;
/// see the integration tests for the pattern.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request and resolves when the full response is buffered.
    ///
    /// # Errors
    ///
    /// Implementations map network failures to [`Error::Transport`]; non-success
    /// statuses are returned as ordinary responses for the caller to inspect.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error>;

    /// Sends a request and returns the response with an incremental body.
    ///
    /// # Errors
    ///
    /// Implementations map network failures to [`Error::Transport`].
    async fn send_stream(&self, request: HttpRequest) -> Result<HttpStreamResponse, Error>;
}

/// Thread-safe handle to a transport implementation.
pub type DynHttpTransport = Arc<dyn HttpTransport>;

/// Serializes a body to JSON, attaches headers, and issues a POST request.
///
/// # Errors
///
/// Returns [`Error::InvalidRequest`] if serialization fails, otherwise forwards
/// the transport outcome.
pub async fn post_json_with_headers<T: Serialize>(
    transport: &dyn HttpTransport,
    url: impl Into<String>,
    headers: HashMap<String, String>,
    body: &T,
) -> Result<HttpResponse, Error> {
    let payload = serde_json::to_vec(body)
        .map_err(|err| Error::invalid_request(format!("failed to serialize request: {err}")))?;
    let request = HttpRequest::post_json(url, payload).with_headers(headers);
    transport.send(request).await
}

/// Like [`post_json_with_headers`] but returns the streaming response.
///
/// # Errors
///
/// Returns [`Error::InvalidRequest`] if serialization fails, otherwise forwards
/// the transport outcome.
pub async fn post_json_stream_with_headers<T: Serialize>(
    transport: &dyn HttpTransport,
    url: impl Into<String>,
    headers: HashMap<String, String>,
    body: &T,
) -> Result<HttpStreamResponse, Error> {
    let payload = serde_json::to_vec(body)
        .map_err(|err| Error::invalid_request(format!("failed to serialize request: {err}")))?;
    let request = HttpRequest::post_json(url, payload).with_headers(headers);
    transport.send_stream(request).await
}

/// Drains a body stream into a diagnostic string, best effort.
///
/// Used when a streaming endpoint answers with a non-success status: the body
/// then holds an error document, not an event stream. Read failures truncate
/// the result instead of masking the status error.
pub(crate) async fn collect_body_text(mut body: HttpBodyStream) -> String {
    let mut buffer = Vec::new();
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => buffer.extend_from_slice(&bytes),
            Err(_) => break,
        }
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

pub mod reqwest;
