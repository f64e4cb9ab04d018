//! Embedding, vector store and semantic search behaviour across crates.

use chatvault_core::config::{QdrantConfig, SearchConfig, VectorBackend};
use chatvault_core::OwnerId;
use chatvault_history::HistoryStore;
use chatvault_integration_tests::conversation_with;
use chatvault_memory::{
    load_embedding_provider, EmbeddingOptions, EmbeddingProvider, HashEmbeddings, InProcessVectorStore,
    SemanticSearchService,
};
use std::sync::Arc;

fn in_process(history: &Arc<HistoryStore>) -> SemanticSearchService {
    let store = Arc::new(InProcessVectorStore::new(history.clone(), 384));
    SemanticSearchService::new(Arc::new(HashEmbeddings::default()), store).unwrap()
}

#[tokio::test]
async fn embeddings_are_deterministic_and_fixed_length() {
    let provider = load_embedding_provider("hash-384", &EmbeddingOptions::default()).unwrap();
    let texts = vec![
        "How do lifetimes work?".to_string(),
        String::new(),
        "a much longer paragraph about borrowing, ownership and moves in rust".repeat(20),
    ];

    let first = provider.embed(&texts).await.unwrap();
    let second = provider.embed(&texts).await.unwrap();

    assert_eq!(first, second);
    for vector in &first {
        assert_eq!(vector.len(), provider.dimension());
        assert_eq!(vector.len(), 384);
    }
}

#[tokio::test]
async fn search_never_returns_another_owners_messages() {
    let history = Arc::new(HistoryStore::in_memory());
    let alice = OwnerId::new("alice");
    let bob = OwnerId::new("bob");

    let (_, alice_ids) = conversation_with(
        &history,
        &alice,
        &[
            "rust borrow checker and lifetimes",
            "sourdough starter feeding schedule",
            "async rust with tokio tasks",
        ],
    )
    .await;
    let (_, bob_ids) = conversation_with(
        &history,
        &bob,
        &[
            "rust borrow checker and lifetimes",
            "async rust with tokio tasks and channels",
        ],
    )
    .await;

    let service = in_process(&history);
    let texts = [
        "rust borrow checker and lifetimes",
        "sourdough starter feeding schedule",
        "async rust with tokio tasks",
    ];
    for (id, text) in alice_ids.iter().zip(texts) {
        service.index_message(*id, text, &alice).await.unwrap();
    }
    let bob_texts = [
        "rust borrow checker and lifetimes",
        "async rust with tokio tasks and channels",
    ];
    for (id, text) in bob_ids.iter().zip(bob_texts) {
        service.index_message(*id, text, &bob).await.unwrap();
    }

    for limit in [1, 2, 10] {
        let results = service.search(&alice, "rust tokio lifetimes", limit).await.unwrap();
        assert!(!results.is_empty());
        assert!(results.len() <= limit);
        assert!(results.iter().all(|m| alice_ids.contains(&m.message_id)));
        assert!(results.iter().all(|m| !bob_ids.contains(&m.message_id)));
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[tokio::test]
async fn indexed_message_is_its_own_best_match() {
    let history = Arc::new(HistoryStore::in_memory());
    let owner = OwnerId::new("alice");
    let text = "What is the difference between Box and Rc?";
    let (_, ids) = conversation_with(
        &history,
        &owner,
        &[text, "Recommend a hiking trail near Zurich"],
    )
    .await;

    let service = in_process(&history);
    service.index_message(ids[0], text, &owner).await.unwrap();
    service
        .index_message(ids[1], "Recommend a hiking trail near Zurich", &owner)
        .await
        .unwrap();

    let results = service.search(&owner, text, 1).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].message_id, ids[0]);
    assert!((results[0].score - 1.0).abs() < 1e-4);
}

#[tokio::test]
async fn unreachable_remote_backend_falls_back_to_in_process() {
    let history = Arc::new(HistoryStore::in_memory());
    let owner = OwnerId::new("alice");
    let (_, ids) = conversation_with(&history, &owner, &["vector databases compared"]).await;

    let config = SearchConfig {
        backend: VectorBackend::Qdrant,
        qdrant: QdrantConfig {
            url: "http://127.0.0.1:9".to_string(),
            api_key: None,
        },
        ..SearchConfig::default()
    };

    let service =
        SemanticSearchService::from_config(&config, &EmbeddingOptions::default(), history.clone())
            .await
            .unwrap();
    assert_eq!(service.backend_name(), Some("in_process"));

    service
        .index_message(ids[0], "vector databases compared", &owner)
        .await
        .unwrap();
    let results = service.search(&owner, "vector databases", 5).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].message_id, ids[0]);
}

#[tokio::test]
async fn unknown_embedding_model_disables_search_without_failing() {
    let history = Arc::new(HistoryStore::in_memory());
    let config = SearchConfig {
        embedding_model: "no-such-model".to_string(),
        ..SearchConfig::default()
    };

    let service =
        SemanticSearchService::from_config(&config, &EmbeddingOptions::default(), history)
            .await
            .unwrap();
    assert!(!service.is_available());
    assert!(service
        .search(&OwnerId::new("alice"), "anything", 5)
        .await
        .unwrap()
        .is_empty());
}
