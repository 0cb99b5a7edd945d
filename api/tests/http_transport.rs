//! reqwest transport against a mock HTTP server

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use press_api::{ApiClient, ApiConfig, ApiRequest, CallApi, HttpTransport, Transport};
use reqwest::{Method, StatusCode, Url};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn url(server: &MockServer, endpoint: &str) -> Url {
    Url::parse(&format!("{}{endpoint}", server.uri())).unwrap()
}

#[tokio::test]
async fn get_sends_json_headers_and_no_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp/v2/pages/7"))
        .and(header("accept", "application/json"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 7 })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new().unwrap();
    let request = ApiRequest::new(Method::GET, url(&server, "/wp/v2/pages/7"), Some(json!({ "dropped": true })));
    let response = transport.send(request).await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<serde_json::Value>(&response.body).unwrap(), json!({ "id": 7 }));

    let received = server.received_requests().await.unwrap();
    assert!(received[0].body.is_empty());
}

#[tokio::test]
async fn post_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp/v2/comments"))
        .and(body_json(json!({ "content": "Nice post" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 31 })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new().unwrap();
    let request = ApiRequest::new(
        Method::POST,
        url(&server, "/wp/v2/comments"),
        Some(json!({ "content": "Nice post" })),
    );
    let response = transport.send(request).await.unwrap();
    assert_eq!(response.status, StatusCode::CREATED);
}

#[tokio::test]
async fn error_status_is_a_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "Not found" })))
        .mount(&server)
        .await;

    let transport = HttpTransport::new().unwrap();
    let response = transport
        .send(ApiRequest::new(Method::GET, url(&server, "/missing"), None))
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(!response.is_success());
}

#[tokio::test]
async fn session_cookies_are_sent_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "session=abc123; Path=/")
                .set_body_json(json!({ "success": true })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("cookie", "session=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new().unwrap();
    transport
        .send(ApiRequest::new(Method::POST, url(&server, "/login"), Some(json!({}))))
        .await
        .unwrap();
    let me = transport
        .send(ApiRequest::new(Method::GET, url(&server, "/me"), None))
        .await
        .unwrap();
    assert_eq!(me.status, StatusCode::OK);
}

#[tokio::test]
async fn requests_without_credentials_carry_no_cookies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "session=abc123; Path=/")
                .set_body_json(json!({ "success": true })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/public"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 2 })))
        .mount(&server)
        .await;

    let transport = HttpTransport::new().unwrap();
    transport
        .send(ApiRequest::new(Method::POST, url(&server, "/login"), Some(json!({}))))
        .await
        .unwrap();

    let mut public = ApiRequest::new(Method::GET, url(&server, "/public"), None);
    public.include_credentials = false;
    let response = transport.send(public).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);

    let received = server.received_requests().await.unwrap();
    let sent = received.iter().find(|r| r.url.path() == "/public").unwrap();
    assert!(sent.headers.get("cookie").is_none());
}

#[tokio::test]
async fn supplied_client_is_used_for_every_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&server)
        .await;

    let transport = HttpTransport::with_client(reqwest::Client::builder().cookie_store(true).build().unwrap());
    let mut anonymous = ApiRequest::new(Method::GET, url(&server, "/ping"), None);
    anonymous.include_credentials = false;

    transport.send(anonymous).await.unwrap();
    let response = transport
        .send(ApiRequest::new(Method::GET, url(&server, "/ping"), None))
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn client_settles_real_http_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/posts"))
        .and(query_param("per_page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "featured_media": 4 },
            { "id": 2, "featured_media": 0 }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/posts/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "Not found" })))
        .mount(&server)
        .await;

    let client = ApiClient::new(
        ApiConfig::new(format!("{}/wp-json", server.uri())),
        Arc::new(HttpTransport::new().unwrap()),
    );

    let list = client
        .prepare(CallApi::<()>::new("FETCH_POSTS", "/posts").with_option("per_page", 2_i64), &())
        .unwrap();
    let success = client.execute(list).await;
    assert_eq!(success.action_type, "FETCH_POSTS_SUCCESS");
    assert_eq!(
        success.response().map(|p| serde_json::to_value(p).unwrap()),
        Some(json!([{ "id": 1, "featuredMedia": 4 }, { "id": 2, "featuredMedia": 0 }]))
    );

    let missing = client
        .prepare(CallApi::<()>::new("FETCH_POSTS", "/posts/99"), &())
        .unwrap();
    let failure = client.execute(missing).await;
    assert_eq!(failure.action_type, "FETCH_POSTS_FAILURE");
    assert_eq!(failure.error(), Some("Not found"));
}
