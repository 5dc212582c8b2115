//! `ReqwestExecutor` and `AuthenticatedClient` against a mock HTTP server.

use auth_http_client::{
    AuthConfig, AuthenticatedClient, HttpConfig, HttpMethod, HttpRequest, RequestExecutor,
    RequestOptions, ReqwestExecutor,
};
use rust_common::{normalize, RetryConfig};
use serde_json::json;
use std::net::TcpListener;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn executor(server: &MockServer) -> ReqwestExecutor {
    ReqwestExecutor::new(&HttpConfig::default().with_base_url(server.uri())).unwrap()
}

#[tokio::test]
async fn test_success_decodes_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/1"))
        .and(query_param("expand", "roles"))
        .and(header("x-trace", "t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    let response = executor(&server)
        .get(
            "/users/1",
            RequestOptions::default()
                .with_param("expand", "roles")
                .with_header("x-trace", "t1"),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.status_text, "OK");
    assert_eq!(response.data, json!({ "id": 1 }));
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_json(json!({ "name": "ann" })))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let response = executor(&server)
        .post("/users", json!({ "name": "ann" }), RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.data, serde_json::Value::Null);
}

#[tokio::test]
async fn test_error_status_becomes_transport_error_with_response() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/users/9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "not found" })))
        .mount(&server)
        .await;

    let err = executor(&server)
        .send(HttpRequest::new(HttpMethod::Delete, "/users/9"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert!(!err.is_retryable());
    let transport = err.transport().unwrap();
    assert_eq!(transport.message, "Request failed with status code 404");
    let record = normalize(&err).to_json();
    assert_eq!(record["response"]["status"], json!(404));
    assert_eq!(record["response"]["statusText"], json!("Not Found"));
    assert_eq!(record["response"]["data"], json!({ "error": "not found" }));
    assert_eq!(record["config"]["method"], json!("DELETE"));
    assert_eq!(record["config"]["path"], json!("/users/9"));
}

#[tokio::test]
async fn test_connection_failure_has_no_response() {
    // Nothing listens on a port freed right after binding.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let executor = ReqwestExecutor::new(
        &HttpConfig::default()
            .with_base_url(format!("http://{addr}"))
            .with_connect_timeout(Duration::from_secs(1)),
    )
    .unwrap();

    let err = executor
        .get("/ping", RequestOptions::default())
        .await
        .unwrap_err();

    let transport = err.transport().unwrap();
    assert!(transport.response.is_none());
    assert!(transport.code.is_some());
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_text_body_is_a_successful_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .mount(&server)
        .await;

    let response = executor(&server)
        .get("/health", RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.data, json!("pong"));
}

#[tokio::test]
async fn test_text_body_is_not_resent_by_client() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "abc", "expires_in": 3600 })),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/jobs/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("accepted"))
        .expect(1)
        .mount(&server)
        .await;

    let config = AuthConfig::bearer("/auth/token", json!({ "client_id": "svc" }));
    let client = AuthenticatedClient::with_executor(executor(&server), config);

    let response = client
        .put("/jobs/1", json!({ "run": true }), RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(response.data, json!("accepted"));
}

#[tokio::test]
async fn test_authenticated_client_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .and(body_json(json!({ "client_id": "svc" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "abc", "expires_in": 3600 })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
        .expect(2)
        .mount(&server)
        .await;

    let config = AuthConfig::bearer("/auth/token", json!({ "client_id": "svc" }))
        .with_retry(RetryConfig::default().with_max_retries(0));
    let client = AuthenticatedClient::with_executor(executor(&server), config);

    for _ in 0..2 {
        let response = client.get("/orders", RequestOptions::default()).await.unwrap();
        assert_eq!(response.json::<Vec<serde_json::Value>>().unwrap().len(), 1);
    }
}
