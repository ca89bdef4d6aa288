#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for ragvault-gateway.
//!
//! Drives the full router with `tower::ServiceExt::oneshot`: auth, rate
//! limiting, validation, document ingestion, search, completion and the
//! admin routes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ragvault_agent::{CompletionClient, ModelConfig};
use ragvault_gateway::{AppState, GatewayServer};
use ragvault_memory::{DocumentStore, LocalEmbedding, RetrievalService};
use ragvault_security::{Credentials, RateLimiter, Sanitizer, TokenIssuer};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const SECRET: &str = "gateway-test-secret";

struct Options {
    model_url: String,
    login_per_minute: u32,
    api_per_minute: u32,
    allow_erase: bool,
    snapshot_path: PathBuf,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            model_url: "http://127.0.0.1:1".to_string(),
            login_per_minute: 50,
            api_per_minute: 30,
            allow_erase: false,
            snapshot_path: PathBuf::from("unused.jsonl"),
        }
    }
}

fn state(opts: Options) -> Arc<AppState> {
    let store = DocumentStore::new(Arc::new(LocalEmbedding::default()));
    let completion = CompletionClient::new(ModelConfig {
        base_url: opts.model_url,
        timeout_secs: 5,
        ..ModelConfig::default()
    })
    .unwrap();

    Arc::new(AppState {
        retrieval: Arc::new(RetrievalService::new(Arc::new(store))),
        completion: Arc::new(completion),
        tokens: TokenIssuer::new(SECRET, Duration::from_secs(3600)).unwrap(),
        credentials: Credentials::new("admin", "hunter2"),
        login_limiter: RateLimiter::per_minute(opts.login_per_minute),
        api_limiter: RateLimiter::per_minute(opts.api_per_minute),
        sanitizer: Sanitizer::default(),
        snapshot_path: opts.snapshot_path,
        allow_erase: opts.allow_erase,
    })
}

fn app_with(opts: Options) -> (Router, String) {
    let state = state(opts);
    let token = state.tokens.issue("admin").unwrap();
    (GatewayServer::build(state), token)
}

fn app() -> (Router, String) {
    app_with(Options::default())
}

fn post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn seed(app: &Router, token: &str) {
    let docs = json!({"input_docs": [
        ["This is a document about bananas", {"topic": "fruit"}],
        ["This is a document about apples", {"topic": "fruit"}],
        ["This is a document about hammers", {"topic": "tools"}],
        ["This is a document about saws", {"topic": "tools"}],
    ]});
    let (status, _) = send(app, post("/api/add_documents", Some(token), docs)).await;
    assert_eq!(status, StatusCode::OK);
}

// ---------------------------------------------------------------------------
// 1. Health and login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_is_open() {
    let (app, _) = app();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"status": "ok", "service": "ragvault", "documents": 0})
    );
}

#[tokio::test]
async fn login_issues_a_working_token() {
    let (app, _) = app();
    let (status, body) = send(
        &app,
        post("/api/login", None, json!({"username": "admin", "password": "hunter2"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        post("/api/query_similar_docs", Some(&token), json!({"input_string": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"], "admin");
    assert_eq!(body["docs"], json!([]));
}

#[tokio::test]
async fn login_with_wrong_password_is_401() {
    let (app, _) = app();
    let (status, body) = send(
        &app,
        post("/api/login", None, json!({"username": "admin", "password": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"message": "Invalid credentials"}));
}

#[tokio::test]
async fn login_is_rate_limited() {
    let (app, _) = app_with(Options {
        login_per_minute: 2,
        ..Options::default()
    });
    let attempt = || post("/api/login", None, json!({"username": "x", "password": "y"}));
    assert_eq!(send(&app, attempt()).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(send(&app, attempt()).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(send(&app, attempt()).await.0, StatusCode::TOO_MANY_REQUESTS);
}

// ---------------------------------------------------------------------------
// 2. Authentication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_token_is_401() {
    let (app, _) = app();
    let (status, body) = send(
        &app,
        post("/api/query_similar_docs", None, json!({"input_string": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"message": "Missing token"}));
}

#[tokio::test]
async fn bad_token_is_401() {
    let (app, _) = app();
    let (status, body) = send(
        &app,
        post("/api/add_document", Some("not.a.token"), json!({"input_doc": ["x"]})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"message": "Invalid token"}));

    let foreign = TokenIssuer::new("someone-else", Duration::from_secs(60))
        .unwrap()
        .issue("admin")
        .unwrap();
    let (status, _) = send(
        &app,
        post("/api/add_document", Some(&foreign), json!({"input_doc": ["x"]})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_401() {
    let (app, _) = app();
    let issuer = TokenIssuer::new(SECRET, Duration::from_secs(60)).unwrap();
    let stale = issuer.issue_at("admin", 1_000_000).unwrap();
    let (status, body) = send(
        &app,
        post("/api/query_similar_docs", Some(&stale), json!({"input_string": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"message": "Token expired"}));
}

#[tokio::test]
async fn api_is_rate_limited_per_user() {
    let (app, token) = app_with(Options {
        api_per_minute: 2,
        ..Options::default()
    });
    let query = || post("/api/query_similar_docs", Some(&token), json!({"input_string": "hi"}));
    assert_eq!(send(&app, query()).await.0, StatusCode::OK);
    assert_eq!(send(&app, query()).await.0, StatusCode::OK);
    let (status, body) = send(&app, query()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body, json!({"error": "Rate limit exceeded"}));
}

// ---------------------------------------------------------------------------
// 3. Documents and search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_document_then_duplicate() {
    let (app, token) = app();
    let doc = json!({"input_doc": ["This is a document about wrenches", {"topic": "tools"}]});

    let (status, body) = send(&app, post("/api/add_document", Some(&token), doc.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response_string"], "document added to vector database");
    assert!(body["id"].is_string());
    assert_eq!(body["user"], "admin");

    let (status, body) = send(&app, post("/api/add_document", Some(&token), doc)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response_string"], "document already present");
    assert!(body["id"].is_null());
}

#[tokio::test]
async fn add_documents_reports_counts() {
    let (app, token) = app();
    seed(&app, &token).await;

    let again = json!({"input_docs": [
        ["This is a document about saws", {"topic": "tools"}],
        ["This is a document about drills", {"topic": "tools"}],
    ]});
    let (status, body) = send(&app, post("/api/add_documents", Some(&token), again)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["added"], 1);
    assert_eq!(body["skipped"], 1);
    assert!(body["ids"][0].is_null());
    assert!(body["ids"][1].is_string());
}

#[tokio::test]
async fn query_similar_docs_ranks_and_limits() {
    let (app, token) = app();
    seed(&app, &token).await;

    let (status, body) = send(
        &app,
        post(
            "/api/query_similar_docs",
            Some(&token),
            json!({"input_string": "saws", "num_docs": 2}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let docs = body["docs"].as_array().unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["text"], "This is a document about saws");
    assert_eq!(docs[0]["metadata"]["topic"], "tools");
    assert!(docs[0]["similarity"].as_f64().unwrap() >= docs[1]["similarity"].as_f64().unwrap());
}

#[tokio::test]
async fn query_filtered_docs_apple_hammer() {
    let (app, token) = app();
    for doc in [json!(["apple", {"topic": "fruit"}]), json!(["hammer", {"topic": "tools"}])] {
        let (status, _) = send(&app, post("/api/add_document", Some(&token), json!({"input_doc": doc}))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &app,
        post(
            "/api/query_filtered_docs",
            Some(&token),
            json!({"input_string": "tool", "filter_key": "topic", "values": ["tools"], "num_docs": 5}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let docs = body["docs"].as_array().unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["text"], "hammer");

    let (_, body) = send(
        &app,
        post(
            "/api/query_filtered_docs",
            Some(&token),
            json!({"input_string": "tool", "filter_key": "topic", "values": ["fruit", "tools"], "num_docs": 5}),
        ),
    )
    .await;
    assert_eq!(body["docs"].as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// 4. Validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_json_content_type_is_400() {
    let (app, token) = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/query_similar_docs")
        .header(header::CONTENT_TYPE, "text/plain")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from("input_string=hi"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Content-Type must be application/json"}));
}

#[tokio::test]
async fn field_validation_messages() {
    let (app, token) = app();
    let cases = [
        (json!({}), "input_string is required"),
        (json!({"input_string": 42}), "input_string must be a string"),
        (json!({"input_string": "a".repeat(2001)}), "input_string too long"),
        (json!({"input_string": "bad\u{7}bell"}), "input_string contains invalid characters"),
        (
            json!({"input_string": "ok", "num_docs": 0}),
            "num_docs must be an integer between 1 and 100",
        ),
    ];
    for (payload, expected) in cases {
        let (status, body) = send(&app, post("/api/query_similar_docs", Some(&token), payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{expected}");
        assert_eq!(body["error"], expected);
    }
}

#[tokio::test]
async fn malformed_document_is_400() {
    let (app, token) = app();
    let (status, body) = send(
        &app,
        post("/api/add_document", Some(&token), json!({"input_doc": "just text"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("input_doc must be"));
}

// ---------------------------------------------------------------------------
// 5. Completion
// ---------------------------------------------------------------------------

fn completion_reply(content: &str) -> Value {
    json!({"choices": [{"message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]})
}

#[tokio::test]
async fn complete_returns_model_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_reply("Use a hammer.")))
        .mount(&server)
        .await;

    let (app, token) = app_with(Options {
        model_url: server.uri(),
        ..Options::default()
    });
    let (status, body) = send(
        &app,
        post("/api/complete", Some(&token), json!({"input_string": "How do I drive a nail?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"response_string": "Use a hammer.", "user": "admin"}));
}

#[tokio::test]
async fn complete_json_mode_returns_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion_reply(r#"{"tool": "hammer"}"#)),
        )
        .mount(&server)
        .await;

    let (app, token) = app_with(Options {
        model_url: server.uri(),
        ..Options::default()
    });
    let (status, body) = send(
        &app,
        post(
            "/api/complete",
            Some(&token),
            json!({"input_string": "Which tool?", "output_json": true}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response_string"], json!({"tool": "hammer"}));
}

#[tokio::test]
async fn complete_with_unreachable_model_is_fail_soft() {
    let (app, token) = app();
    let (status, body) = send(
        &app,
        post("/api/complete", Some(&token), json!({"input_string": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response_string"], "");

    let (status, body) = send(
        &app,
        post(
            "/api/complete",
            Some(&token),
            json!({"input_string": "hello", "output_json": true}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response_string"], json!({}));
}

// ---------------------------------------------------------------------------
// 6. Admin
// ---------------------------------------------------------------------------

#[tokio::test]
async fn save_writes_snapshot() {
    let tmp = TempDir::new().unwrap();
    let snapshot = tmp.path().join("data").join("documents.jsonl");
    let (app, token) = app_with(Options {
        snapshot_path: snapshot.clone(),
        ..Options::default()
    });
    seed(&app, &token).await;

    let (status, body) = send(&app, post("/api/admin/save", Some(&token), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"saved": 4}));

    let contents = std::fs::read_to_string(&snapshot).unwrap();
    assert_eq!(contents.lines().count(), 4);
}

#[tokio::test]
async fn erase_is_forbidden_by_default() {
    let (app, token) = app();
    seed(&app, &token).await;
    let (status, _) = send(&app, post("/api/admin/erase", Some(&token), json!({"confirm": true}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn erase_requires_confirmation_when_enabled() {
    let (app, token) = app_with(Options {
        allow_erase: true,
        ..Options::default()
    });
    seed(&app, &token).await;

    let (status, body) = send(&app, post("/api/admin/erase", Some(&token), json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "confirm must be true");

    let (status, body) = send(&app, post("/api/admin/erase", Some(&token), json!({"confirm": true}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"erased": 4}));

    let (_, body) = send(
        &app,
        post("/api/query_similar_docs", Some(&token), json!({"input_string": "saws"})),
    )
    .await;
    assert_eq!(body["docs"], json!([]));
}
