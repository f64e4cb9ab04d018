//! Chat provider adapter: cost estimation, Gemini model resolution and
//! vendor error translation, against mock vendor endpoints.

use chatvault_core::config::{ProviderEndpoint, ProvidersConfig};
use chatvault_core::{Platform, SecretString};
use chatvault_providers::google::resolve_model;
use chatvault_providers::pricing::estimate_cost;
use chatvault_providers::{ChatProviderAdapter, ChatTurn, ProviderError};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn adapter_for(base: &str) -> ChatProviderAdapter {
    let endpoint = || ProviderEndpoint {
        base_url: Some(base.to_string()),
    };
    let config = ProvidersConfig {
        openai: endpoint(),
        anthropic: endpoint(),
        google: endpoint(),
    };
    ChatProviderAdapter::new(&config).unwrap()
}

#[test]
fn gpt4_cost_uses_the_70_30_split() {
    let cost = estimate_cost(Platform::OpenAI, "gpt-4", 1000);
    let expected = 1000.0 * 0.7 * 0.00003 + 1000.0 * 0.3 * 0.00006;
    assert!((cost - expected).abs() < 1e-12);
    assert!((cost - 0.039).abs() < 1e-12);
}

#[test]
fn unknown_model_is_priced_as_gpt35() {
    assert_eq!(
        estimate_cost(Platform::OpenAI, "my-finetune", 1000),
        estimate_cost(Platform::OpenAI, "gpt-3.5-turbo", 1000)
    );
}

#[test]
fn gemini_flash_without_flash_models_resolves_to_gemini_pro() {
    let available = vec!["gemini-1.5-pro-latest".to_string(), "gemini-pro".to_string()];
    assert_eq!(resolve_model("gemini-1.5-flash", &available), "gemini-pro");
}

#[tokio::test]
async fn google_send_uses_the_resolved_model() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .and(query_param("key", "g-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                { "name": "models/gemini-1.5-pro-latest", "supportedGenerationMethods": ["generateContent"] },
                { "name": "models/gemini-pro", "supportedGenerationMethods": ["generateContent"] },
                { "name": "models/embedding-001", "supportedGenerationMethods": ["embedContent"] }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-pro:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Hello from Gemini" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "totalTokenCount": 42 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = adapter_for(&server.uri())
        .send(
            Platform::Google,
            "gemini-1.5-flash",
            &SecretString::new("g-key"),
            &[ChatTurn::user("hi")],
        )
        .await
        .unwrap();

    assert_eq!(reply.content, "Hello from Gemini");
    assert_eq!(reply.tokens, 42);
    assert_eq!(reply.metadata["model"], "gemini-pro");
}

#[tokio::test]
async fn auth_failures_keep_the_vendor_message_on_every_platform() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Incorrect API key provided: sk-bad", "type": "invalid_request_error" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "type": "error",
            "error": { "type": "authentication_error", "message": "invalid x-api-key" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-pro:generateContent"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT" }
        })))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server.uri());
    let key = SecretString::new("bad");
    let cases = [
        (Platform::OpenAI, "gpt-4", "Incorrect API key provided: sk-bad"),
        (Platform::Anthropic, "claude-3-opus-20240229", "invalid x-api-key"),
        (
            Platform::Google,
            "gemini-pro",
            "API key not valid. Please pass a valid API key.",
        ),
    ];

    for (platform, model, expected) in cases {
        let err = adapter
            .send(platform, model, &key, &[ChatTurn::user("hello")])
            .await
            .unwrap_err();
        match err {
            ProviderError::AuthFailed(message) => assert_eq!(message, expected, "{}", platform),
            other => panic!("{}: expected AuthFailed, got {:?}", platform, other),
        }
    }
}

#[tokio::test]
async fn rate_limits_and_missing_models_are_typed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "message": "Rate limit reached for gpt-4" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "type": "error",
            "error": { "type": "not_found_error", "message": "model: claude-9" }
        })))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server.uri());
    let key = SecretString::new("k");

    let err = adapter
        .send(Platform::OpenAI, "gpt-4", &key, &[ChatTurn::user("hi")])
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::RateLimited(ref m) if m == "Rate limit reached for gpt-4"));

    let err = adapter
        .send(Platform::Anthropic, "claude-9", &key, &[ChatTurn::user("hi")])
        .await
        .unwrap_err();
    match err {
        ProviderError::ModelNotFound { model, message, .. } => {
            assert_eq!(model, "claude-9");
            assert_eq!(message, "model: claude-9");
        }
        other => panic!("expected ModelNotFound, got {:?}", other),
    }
}
