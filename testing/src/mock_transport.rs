//! Scripted HTTP transport for store and middleware tests.

use futures::future::BoxFuture;
use press_api::{ApiRequest, ApiResponse, Transport, TransportError};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Reply {
    Response(ApiResponse),
    Error(TransportError),
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    path: String,
    reply: Reply,
    delay: Option<Duration>,
}

/// In-memory [`Transport`] with scripted routes
///
/// Routes match on method and URL path (the query string is ignored). The
/// first matching route answers. Unmatched requests get a 404 with a
/// WordPress-style body that has no `error` field.
///
/// Every request is recorded, matched or not.
///
/// # Example
///
/// ```
/// use press_testing::MockTransport;
/// use reqwest::Method;
/// use serde_json::json;
/// use std::time::Duration;
///
/// let transport = MockTransport::new()
///     .respond_json(Method::GET, "/wp-json/wp/v2/pages/7", 200, json!({ "id": 7 }))
///     .with_delay(Method::GET, "/wp-json/wp/v2/pages/7", Duration::from_millis(20));
/// assert_eq!(transport.request_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Vec<Route>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    /// Transport with no routes
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with `response`
    #[must_use]
    pub fn respond(mut self, method: Method, path: &str, response: ApiResponse) -> Self {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            reply: Reply::Response(response),
            delay: None,
        });
        self
    }

    /// Answer `method path` with a JSON body
    ///
    /// # Panics
    ///
    /// Panics if `status` is not a valid HTTP status code.
    #[must_use]
    #[allow(clippy::expect_used)] // Test helper
    pub fn respond_json(self, method: Method, path: &str, status: u16, body: Value) -> Self {
        let status = StatusCode::from_u16(status).expect("valid HTTP status code");
        self.respond(method, path, ApiResponse::json(status, &body))
    }

    /// Answer `method path` with raw bytes
    #[must_use]
    pub fn respond_raw(self, method: Method, path: &str, status: StatusCode, body: &[u8]) -> Self {
        self.respond(
            method,
            path,
            ApiResponse {
                status,
                body: body.to_vec(),
            },
        )
    }

    /// Fail `method path` at the network level
    #[must_use]
    pub fn fail(mut self, method: Method, path: &str, error: TransportError) -> Self {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            reply: Reply::Error(error),
            delay: None,
        });
        self
    }

    /// Delay every reply for `method path`
    #[must_use]
    pub fn with_delay(mut self, method: Method, path: &str, delay: Duration) -> Self {
        for route in &mut self.routes {
            if route.method == method && route.path == path {
                route.delay = Some(delay);
            }
        }
        self
    }

    /// Requests received so far, in order
    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received so far
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn route_for(&self, request: &ApiRequest) -> Option<&Route> {
        self.routes
            .iter()
            .find(|route| route.method == request.method && route.path == request.url.path())
    }
}

impl Transport for MockTransport {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, TransportError>> {
        let route = self.route_for(&request).cloned();
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        Box::pin(async move {
            let Some(route) = route else {
                return Ok(ApiResponse::json(
                    StatusCode::NOT_FOUND,
                    &json!({ "code": "rest_no_route", "message": "No route was found matching the URL and request method" }),
                ));
            };

            if let Some(delay) = route.delay {
                tokio::time::sleep(delay).await;
            }

            match route.reply {
                Reply::Response(response) => Ok(response),
                Reply::Error(error) => Err(error),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use reqwest::Url;

    fn request(method: Method, url: &str) -> ApiRequest {
        ApiRequest::new(method, Url::parse(url).unwrap(), None)
    }

    #[tokio::test]
    async fn test_matches_method_and_path() {
        let transport = MockTransport::new()
            .respond_json(Method::GET, "/posts", 200, json!([]))
            .fail(Method::POST, "/posts", TransportError::Request("offline".into()));

        let ok = transport.send(request(Method::GET, "http://cms.test/posts?page=2")).await.unwrap();
        assert_eq!(ok.status, StatusCode::OK);

        let err = transport.send(request(Method::POST, "http://cms.test/posts")).await;
        assert_eq!(err, Err(TransportError::Request("offline".into())));

        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_unmatched_is_404() {
        let transport = MockTransport::new();
        let response = transport.send(request(Method::GET, "http://cms.test/nowhere")).await.unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(transport.requests()[0].url.path(), "/nowhere");
    }
}
