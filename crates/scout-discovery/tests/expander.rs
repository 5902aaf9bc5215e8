//! Integration tests for `ChatExpander` against a mock chat endpoint.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scout_core::LlmConfig;
use scout_discovery::{ChatExpander, ExpanderError, QueryExpander};

fn expander_for(server: &MockServer) -> ChatExpander {
    let config = LlmConfig {
        api_key: "test-key".to_string(),
        api_base: format!("{}/v1/", server.uri()),
        model: "test-model".to_string(),
    };
    ChatExpander::new(&config, Duration::from_secs(2)).expect("failed to build test ChatExpander")
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content } }
        ]
    })
}

#[tokio::test]
async fn expand_parses_components_from_chat_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({ "model": "test-model" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "Related components:\n- paper filter\n- gooseneck kettle\n\nSearch strategy: Brewing gear first.",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let expansion = expander_for(&server)
        .expand("pour over coffee")
        .await
        .expect("expansion");

    assert_eq!(expansion.components, vec!["paper filter", "gooseneck kettle"]);
    assert_eq!(expansion.strategy, "Brewing gear first.");
}

#[tokio::test]
async fn unstructured_reply_is_an_empty_expansion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion("Sorry, I cannot help with that.")),
        )
        .mount(&server)
        .await;

    let expansion = expander_for(&server)
        .expand("anything")
        .await
        .expect("expansion");

    assert!(expansion.components.is_empty());
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = expander_for(&server)
        .expand("anything")
        .await
        .expect_err("429 should fail");

    assert!(
        matches!(err, ExpanderError::UnexpectedStatus { status: 429 }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn missing_choices_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = expander_for(&server)
        .expand("anything")
        .await
        .expect_err("empty choices should fail");

    assert!(
        matches!(err, ExpanderError::MalformedResponse(_)),
        "got: {err:?}"
    );
}
