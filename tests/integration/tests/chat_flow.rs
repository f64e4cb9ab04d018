//! End-to-end send, search and rollback through the service facade, with the
//! chat vendor mocked and history persisted to a temporary file.

use chatvault_core::config::{Config, ConfigBuilder, VectorBackend};
use chatvault_core::{Platform, SecretString};
use chatvault_history::{ConversationFilter, Page};
use chatvault_memory::MemoryError;
use chatvault_providers::ProviderError;
use chatvault_service::{ChatVault, SendRequest, ServiceError};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(dir: &tempfile::TempDir, server: &MockServer) -> Config {
    ConfigBuilder::new()
        .user("alice")
        .storage_path(dir.path().join("history.json"))
        .openai_base_url(server.uri())
        .build()
}

async fn conversation_total(vault: &ChatVault) -> usize {
    vault
        .history()
        .list_conversations(vault.owner(), &ConversationFilter::default(), Page::default())
        .await
        .unwrap()
        .total
}

#[tokio::test]
async fn send_persists_reply_and_indexes_both_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": { "role": "assistant", "content": "A borrow is a reference that does not own its value." },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 700, "completion_tokens": 300, "total_tokens": 1000 }
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, &server);
    let vault = ChatVault::open(&config).await.unwrap();
    assert_eq!(vault.search_status().backend, Some("in_process"));

    vault
        .history()
        .upsert_api_key(vault.owner(), Platform::OpenAI, SecretString::new("sk-live"))
        .await
        .unwrap();

    let question = "How does borrowing work in Rust?";
    let outcome = vault
        .send(SendRequest::new(Platform::OpenAI, "gpt-4", question))
        .await
        .unwrap();

    assert_eq!(
        outcome.assistant_message.content,
        "A borrow is a reference that does not own its value."
    );
    assert_eq!(outcome.conversation.title.as_deref(), Some(question));
    assert_eq!(outcome.conversation.total_tokens, 1000);
    assert!((outcome.conversation.total_cost - 0.039).abs() < 1e-9);
    assert_eq!(outcome.assistant_message.metadata["finish_reason"], "stop");

    let hits = vault.semantic_search(question, Some(1)).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].message_id, outcome.user_message.id);
    assert!(hits[0].score.unwrap() > 0.99);

    let records = vault.history().embedding_records(vault.owner()).await.unwrap();
    assert_eq!(records.len(), 2);

    // Reopening reads the persisted file
    drop(vault);
    let reopened = ChatVault::open(&config).await.unwrap();
    assert_eq!(conversation_total(&reopened).await, 1);
    let hits = reopened.semantic_search(question, Some(1)).await.unwrap();
    assert_eq!(hits[0].message_id, outcome.user_message.id);
}

#[tokio::test]
async fn vendor_auth_failure_rolls_back_and_surfaces_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Incorrect API key provided: sk-old", "type": "invalid_request_error" }
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let vault = ChatVault::open(&config(&dir, &server)).await.unwrap();
    vault
        .history()
        .upsert_api_key(vault.owner(), Platform::OpenAI, SecretString::new("sk-old"))
        .await
        .unwrap();

    let err = vault
        .send(SendRequest::new(Platform::OpenAI, "gpt-4", "hello?"))
        .await
        .unwrap_err();
    match err {
        ServiceError::Provider(ProviderError::AuthFailed(message)) => {
            assert_eq!(message, "Incorrect API key provided: sk-old");
        }
        other => panic!("expected AuthFailed, got {:?}", other),
    }

    assert_eq!(conversation_total(&vault).await, 0);
    assert!(vault.text_search("hello", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn send_without_a_stored_key_is_rejected_before_any_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let vault = ChatVault::open(&config(&dir, &server)).await.unwrap();

    let err = vault
        .send(SendRequest::new(Platform::OpenAI, "gpt-4", "hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::MissingApiKey(Platform::OpenAI)));
    assert_eq!(conversation_total(&vault).await, 0);
}

#[tokio::test]
async fn mismatched_collection_keeps_chat_working_and_refuses_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/collections/ai-chat-history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "config": { "params": { "vectors": { "size": 1536, "distance": "Cosine" } } } },
            "status": "ok"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Still here." }, "finish_reason": "stop" }],
            "usage": { "prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8 }
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = ConfigBuilder::new()
        .user("alice")
        .storage_path(dir.path().join("history.json"))
        .openai_base_url(server.uri())
        .backend(VectorBackend::Qdrant)
        .qdrant(server.uri(), None)
        .build();

    let vault = ChatVault::open(&config).await.unwrap();
    let status = vault.search_status();
    assert!(!status.available);
    assert!(status.error.unwrap().contains("1536"));

    vault
        .history()
        .upsert_api_key(vault.owner(), Platform::OpenAI, SecretString::new("sk-live"))
        .await
        .unwrap();
    let outcome = vault
        .send(SendRequest::new(Platform::OpenAI, "gpt-4", "are you there?"))
        .await
        .unwrap();
    assert_eq!(outcome.assistant_message.content, "Still here.");
    assert!(vault.history().embedding_records(vault.owner()).await.unwrap().is_empty());

    let err = vault.semantic_search("are you there?", None).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Memory(MemoryError::DimensionMismatch { expected: 384, actual: 1536 })
    ));
    assert!(vault.text_search("there", None).await.unwrap().len() >= 1);
}
