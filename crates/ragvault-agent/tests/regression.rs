#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Regression tests for ragvault-agent: OpenAiBackend against a mock server,
//! CompletionClient fail-soft behavior.

use ragvault_agent::backends::openai::OpenAiBackend;
use ragvault_agent::{CompletionBackend, CompletionClient, ModelConfig, ResponseFormat};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ModelConfig {
    ModelConfig {
        base_url: server.uri(),
        model_id: "test-model".to_string(),
        timeout_secs: 5,
        ..ModelConfig::default()
    }
}

fn reply(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_backend_sends_prompt_and_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "messages": [{"role": "user", "content": "What is a wrench?"}],
            "response_format": {"type": "text"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("A tool.")))
        .expect(1)
        .mount(&server)
        .await;

    let backend = OpenAiBackend::new(config_for(&server)).unwrap();
    let text = backend
        .complete("What is a wrench?", ResponseFormat::Text)
        .await
        .unwrap();
    assert_eq!(text, "A tool.");
}

#[tokio::test]
async fn test_backend_sends_api_key_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-local"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let config = ModelConfig {
        api_key: "sk-local".to_string(),
        ..config_for(&server)
    };
    let backend = OpenAiBackend::new(config).unwrap();
    assert_eq!(
        backend.complete("x", ResponseFormat::Text).await.unwrap(),
        "ok"
    );
}

#[tokio::test]
async fn test_backend_error_status_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "oom"})))
        .mount(&server)
        .await;

    let backend = OpenAiBackend::new(config_for(&server)).unwrap();
    assert!(backend.complete("x", ResponseFormat::Text).await.is_err());
}

#[tokio::test]
async fn test_client_json_mode() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"response_format": {"type": "json_object"}})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(reply(r#"{"answer": 42, "unit": "nails"}"#)),
        )
        .mount(&server)
        .await;

    let client = CompletionClient::new(config_for(&server)).unwrap();
    assert_eq!(
        client.complete_json("how many?").await,
        json!({"answer": 42, "unit": "nails"})
    );
}

#[tokio::test]
async fn test_client_server_error_is_fail_soft() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"error": "loading"})))
        .mount(&server)
        .await;

    let client = CompletionClient::new(config_for(&server)).unwrap();
    assert_eq!(client.complete_text("hi").await, "");
    assert_eq!(client.complete_json("hi").await, json!({}));
}

#[tokio::test]
async fn test_client_unreachable_is_fail_soft() {
    let config = ModelConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        timeout_secs: 2,
        ..ModelConfig::default()
    };
    let client = CompletionClient::new(config).unwrap();
    assert_eq!(client.complete_text("hi").await, "");
    assert_eq!(client.complete_json("hi").await, json!({}));
}
