//! HTTP transport.
//!
//! [`Transport`] is the seam between the middleware and the network. The
//! default [`HttpTransport`] uses reqwest with a cookie store, so session
//! cookies set by the API are sent back on later calls.

use futures::future::BoxFuture;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;
use thiserror::Error;

/// Network-level failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    /// Request could not be sent or no response arrived
    #[error("Request failed: {0}")]
    Request(String),

    /// Response body could not be read
    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// One outgoing request
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL including the query string
    pub url: Url,
    /// Request headers
    pub headers: HeaderMap,
    /// JSON body, absent for `GET` and `DELETE`
    pub body: Option<Value>,
    /// Send ambient credentials (cookies) with the request
    pub include_credentials: bool,
}

impl ApiRequest {
    /// A JSON request with credentials included
    ///
    /// `GET` and `DELETE` requests drop `body`.
    #[must_use]
    pub fn new(method: Method, url: Url, body: Option<Value>) -> Self {
        let body = if carries_body(&method) { body } else { None };
        Self {
            method,
            url,
            headers: json_headers(),
            body,
            include_credentials: true,
        }
    }
}

/// A settled response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// Status code
    pub status: StatusCode,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Response with a JSON body
    #[must_use]
    pub fn json(status: StatusCode, body: &Value) -> Self {
        Self {
            status,
            body: body.to_string().into_bytes(),
        }
    }

    /// Whether the status is 2xx
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Sends requests
///
/// Object safe so it can be shared as `Arc<dyn Transport>`.
pub trait Transport: Send + Sync {
    /// Send one request and read the whole body
    ///
    /// A non-2xx status is a response, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no response could be obtained.
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, TransportError>>;
}

/// `Accept` and `Content-Type` set to `application/json`
#[must_use]
pub fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

/// Whether requests with `method` may carry a body
#[must_use]
pub fn carries_body(method: &Method) -> bool {
    *method != Method::GET && *method != Method::DELETE
}

/// reqwest-backed transport
///
/// Credentialed requests go through a client with a cookie store; requests
/// with `include_credentials` unset use a second client that never sends or
/// keeps cookies.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    anonymous: Client,
}

impl HttpTransport {
    /// Transport with fresh clients and a cookie store
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Build`] if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, TransportError> {
        let build = |cookies: bool| {
            Client::builder()
                .cookie_store(cookies)
                .build()
                .map_err(|e| TransportError::Build(e.to_string()))
        };

        Ok(Self {
            client: build(true)?,
            anonymous: build(false)?,
        })
    }

    /// Transport around an existing client
    ///
    /// Every request goes through `client`, whatever its
    /// `include_credentials` flag says. Build it with
    /// `Client::builder().cookie_store(true)` for session cookies to be
    /// kept and sent back.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self {
            anonymous: client.clone(),
            client,
        }
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, TransportError>> {
        Box::pin(async move {
            let ApiRequest {
                method,
                url,
                headers,
                body,
                include_credentials,
            } = request;

            let client = if include_credentials { &self.client } else { &self.anonymous };
            let mut builder = client.request(method, url).headers(headers);
            if let Some(body) = body {
                builder = builder.json(&body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| TransportError::Request(e.to_string()))?;

            let status = response.status();
            let body = response
                .bytes()
                .await
                .map_err(|e| TransportError::Body(e.to_string()))?;

            Ok(ApiResponse {
                status,
                body: body.to_vec(),
            })
        })
    }
}
