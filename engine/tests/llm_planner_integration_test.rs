//! LLM planner against a mocked OpenAI-compatible HTTP provider.

use sdk::types::ToolId;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use strand_engine::config::LlmConfig;
use strand_engine::llm::OpenAiProvider;
use strand_engine::planner::{PlanMode, PlanSelector};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn llm_config(base_url: String, timeout_secs: u64) -> LlmConfig {
    LlmConfig {
        base_url,
        api_key: Some("test-key".to_string()),
        timeout_secs,
        ..LlmConfig::default()
    }
}

fn chat_completion(content: &str) -> serde_json::Value {
    json!({
        "choices": [
            {"message": {"role": "assistant", "content": content}}
        ]
    })
}

fn allowed() -> Vec<ToolId> {
    vec![ToolId::Echo, ToolId::HttpFetch]
}

#[tokio::test]
async fn valid_provider_response_becomes_llm_plan() {
    let server = MockServer::start().await;

    let plan_json = r#"{"goal": "fetch the page", "steps": [
        {"id": 1, "tool": "http_fetch", "input": {"url": "https://example.com"}, "why": "fetch it"}
    ]}"#;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(plan_json)))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(llm_config(server.uri(), 5));
    let selector = PlanSelector::llm(Arc::new(provider));

    let (plan, metadata) = selector
        .create_plan("fetch example.com", &allowed(), 3)
        .await;

    assert_eq!(plan.mode, PlanMode::Llm);
    assert_eq!(metadata.mode, PlanMode::Llm);
    assert_eq!(plan.steps.len(), 1);
    assert_eq!(plan.steps[0].tool, ToolId::HttpFetch);
    assert_eq!(plan.reasoning, "fetch the page");
}

#[tokio::test]
async fn fenced_response_is_unwrapped() {
    let server = MockServer::start().await;

    let fenced = "```json\n{\"goal\": \"g\", \"steps\": [{\"id\": 1, \"tool\": \"echo\", \"input\": {\"message\": \"hi\"}, \"why\": \"w\"}]}\n```";

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(fenced)))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(llm_config(server.uri(), 5));
    let selector = PlanSelector::llm(Arc::new(provider));

    let (plan, _) = selector.create_plan("say hi", &allowed(), 3).await;
    assert_eq!(plan.mode, PlanMode::Llm);
    assert_eq!(plan.steps[0].tool, ToolId::Echo);
}

#[tokio::test]
async fn provider_500_falls_back_to_rules() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(llm_config(server.uri(), 5));
    let selector = PlanSelector::llm(Arc::new(provider));

    let (plan, metadata) = selector
        .create_plan("fetch https://example.com", &allowed(), 3)
        .await;

    assert_eq!(plan.mode, PlanMode::LlmFallback);
    assert!(metadata
        .fallback_reason
        .as_deref()
        .is_some_and(|r| r.starts_with("LLM provider error")));
    // The fallback plan is still usable
    assert!(!plan.steps.is_empty());
}

#[tokio::test]
async fn provider_timeout_is_treated_like_any_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_completion("{}"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(llm_config(server.uri(), 1));
    let selector = PlanSelector::llm(Arc::new(provider));

    let (plan, metadata) = selector
        .create_plan("fetch https://example.com", &allowed(), 3)
        .await;

    assert_eq!(plan.mode, PlanMode::LlmFallback);
    assert!(metadata.fallback_reason.is_some());
}

#[tokio::test]
async fn unauthorized_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(llm_config(server.uri(), 5));
    let selector = PlanSelector::llm(Arc::new(provider));

    let (plan, _) = selector.create_plan("echo hi", &allowed(), 3).await;
    assert_eq!(plan.mode, PlanMode::LlmFallback);
}
