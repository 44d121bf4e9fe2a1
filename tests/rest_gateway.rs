//! End-to-end tests of the REST front end against a mock upstream API.

#![cfg(feature = "rest")]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Query, State},
    http::{HeaderMap, Method, Request, StatusCode, Uri},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use piperun_gateway::core::transport::rest::{RestState, router};
use piperun_gateway::domains::operations::Dispatcher;
use piperun_gateway::domains::upstream::{
    Credential, ReqwestTransport, RequestExecutor, RetryPolicy, TOKEN_HEADER,
};

#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    path: String,
    query: BTreeMap<String, String>,
    token: Option<String>,
    body: Value,
}

type Log = Arc<Mutex<Vec<Recorded>>>;

/// Mock CRM: answers by path and records every request it sees.
async fn mock_upstream(
    State(log): State<Log>,
    method: Method,
    uri: Uri,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let token = headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    log.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: uri.path().to_string(),
        query,
        token: token.clone(),
        body: body.clone(),
    });

    if let Some(rejected) = token.as_deref().filter(|t| t.starts_with("sk-revoked")) {
        let message = format!("token {rejected} is invalid");
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": message})));
    }

    match (method.as_str(), uri.path()) {
        ("GET", "/deals") => (
            StatusCode::OK,
            Json(json!({
                "data": [{"id": 1, "title": "Acme renewal", "status": 1}],
                "meta": {"total": 1, "current_page": 1, "last_page": 1}
            })),
        ),
        ("POST", "/deals") => {
            let mut data = body;
            data["id"] = json!(99);
            (StatusCode::CREATED, Json(json!({"data": data})))
        }
        ("GET", "/deals/404") => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Deal not found"})),
        ),
        ("DELETE", "/deals/5") => (StatusCode::OK, Json(json!({"message": "Deal removed"}))),
        ("PUT", "/persons/7") => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"message": "email is invalid"})),
        ),
        ("GET", "/users") => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"message": "maintenance"})),
        ),
        _ => (StatusCode::OK, Json(json!({"data": []}))),
    }
}

struct Harness {
    app: Router,
    log: Log,
}

impl Harness {
    async fn start(default_token: Option<&str>) -> Self {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let upstream = Router::new()
            .fallback(mock_upstream)
            .with_state(log.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, upstream).await.unwrap();
        });

        let transport =
            ReqwestTransport::new(format!("http://{addr}/"), Duration::from_secs(5)).unwrap();
        let executor = RequestExecutor::new(
            Arc::new(transport),
            RetryPolicy::new(2, Duration::from_millis(10)),
        );
        let state = RestState::new(
            Dispatcher::new(executor),
            default_token.and_then(Credential::new),
        );

        Self {
            app: router(state, true),
            log,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn with_json(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("X-Token", token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_create_deal_returns_201_and_forwards_body() {
    let harness = Harness::start(None).await;
    let (status, body) = harness
        .send(with_json(
            Method::POST,
            "/deals",
            Some("abc"),
            json!({"title": "X", "pipeline_id": 1, "stage_id": 2, "owner_id": 3}),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id"], 99);

    let requests = harness.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(requests[0].path, "/deals");
    assert_eq!(requests[0].token.as_deref(), Some("abc"));
    assert_eq!(
        requests[0].body,
        json!({"title": "X", "pipeline_id": 1, "stage_id": 2, "owner_id": 3})
    );
}

#[tokio::test]
async fn test_validation_failure_is_400_without_upstream_call() {
    let harness = Harness::start(Some("env")).await;
    let (status, body) = harness
        .send(with_json(Method::POST, "/deals", None, json!({"title": "X"})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("pipeline_id"));
    assert!(harness.requests().is_empty());
}

#[tokio::test]
async fn test_missing_credential_is_401() {
    let harness = Harness::start(None).await;
    let (status, body) = harness.send(get("/deals")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert!(harness.requests().is_empty());
}

#[tokio::test]
async fn test_query_token_and_numeric_coercion() {
    let harness = Harness::start(None).await;
    let (status, body) = harness.send(get("/deals?status=2&page=1&token=abc")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["title"], "Acme renewal");

    let request = &harness.requests()[0];
    assert_eq!(request.token.as_deref(), Some("abc"));
    assert_eq!(request.query.get("status").map(String::as_str), Some("2"));
    assert_eq!(request.query.get("page").map(String::as_str), Some("1"));
    assert!(!request.query.contains_key("token"));
}

#[tokio::test]
async fn test_non_numeric_filter_rejected() {
    let harness = Harness::start(Some("env")).await;
    let (status, _) = harness.send(get("/deals?status=won")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(harness.requests().is_empty());
}

#[tokio::test]
async fn test_header_beats_default_and_legacy_alias() {
    let harness = Harness::start(Some("env")).await;

    let request = Request::builder()
        .uri("/tags")
        .header("X-PipeRun-Token", "legacy")
        .body(Body::empty())
        .unwrap();
    let (status, _) = harness.send(request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = harness.send(get("/tags")).await;
    assert_eq!(status, StatusCode::OK);

    let tokens: Vec<_> = harness.requests().into_iter().map(|r| r.token).collect();
    assert_eq!(tokens, vec![Some("legacy".to_string()), Some("env".to_string())]);
}

#[tokio::test]
async fn test_upstream_not_found_mirrored() {
    let harness = Harness::start(Some("env")).await;
    let (status, body) = harness.send(get("/deals/404")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["details"]["message"], "Deal not found");
    assert_eq!(harness.requests().len(), 1);
}

#[tokio::test]
async fn test_non_numeric_identifier_rejected() {
    let harness = Harness::start(Some("env")).await;
    let (status, _) = harness.send(get("/deals/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(harness.requests().is_empty());
}

#[tokio::test]
async fn test_delete_returns_success_envelope() {
    let harness = Harness::start(Some("env")).await;
    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/deals/5")
        .body(Body::empty())
        .unwrap();
    let (status, body) = harness.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "message": "Deal deleted successfully"}));
    assert_eq!(harness.requests()[0].method, Method::DELETE);
}

#[tokio::test]
async fn test_update_rejection_mirrors_status() {
    let harness = Harness::start(Some("env")).await;
    let (status, body) = harness
        .send(with_json(Method::PUT, "/persons/7", None, json!({"email": "nope"})))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["message"], "email is invalid");
    assert_eq!(harness.requests()[0].body, json!({"email": "nope"}));
}

#[tokio::test]
async fn test_search_maps_to_list_with_search_param() {
    let harness = Harness::start(Some("env")).await;
    let (status, _) = harness
        .send(with_json(Method::POST, "/deals/search", None, json!({"query": "acme", "show": 5})))
        .await;

    assert_eq!(status, StatusCode::OK);
    let request = &harness.requests()[0];
    assert_eq!(request.method, Method::GET);
    assert_eq!(request.path, "/deals");
    assert_eq!(request.query.get("search").map(String::as_str), Some("acme"));
    assert_eq!(request.query.get("show").map(String::as_str), Some("5"));
}

#[tokio::test]
async fn test_server_errors_retried_then_mirrored() {
    let harness = Harness::start(Some("env")).await;
    let (status, body) = harness.send(get("/users")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert_eq!(harness.requests().len(), 3);
}

#[tokio::test]
async fn test_rejected_credential_is_not_echoed() {
    let harness = Harness::start(None).await;
    let (status, body) = harness.send(get("/pipelines?token=sk-revoked-123")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid token or insufficient permissions");
    assert!(body.get("details").is_none());
    assert!(!body.to_string().contains("sk-revoked-123"));
    assert_eq!(harness.requests().len(), 1);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let harness = Harness::start(Some("env")).await;
    let (status, body) = harness.send(get("/frobnicate")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(harness.requests().is_empty());
}

#[tokio::test]
async fn test_wrong_method_gets_error_envelope() {
    let harness = Harness::start(Some("env")).await;

    let (status, body) = harness
        .send(with_json(Method::POST, "/pipelines", None, json!({})))
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Method POST not allowed on /pipelines");

    let (status, body) = harness.send(get("/deals/search")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["success"], false);

    assert!(harness.requests().is_empty());
}

#[tokio::test]
async fn test_index_and_health() {
    let harness = Harness::start(None).await;

    let (status, body) = harness.send(get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());

    let (status, body) = harness.send(get("/")).await;
    assert_eq!(status, StatusCode::OK);
    let endpoints = body["endpoints"].as_array().unwrap();
    assert_eq!(endpoints.len(), 34);
    assert!(endpoints.iter().any(|e| e["method"] == "POST" && e["path"] == "/deals/search"));
}
