//! CLI commands driven through the library entry point against a temporary
//! history file.

use chatvault_cli::{run, Cli};
use chatvault_core::config::{Config, ConfigBuilder};
use chatvault_service::ChatVault;
use clap::Parser;

fn config(dir: &tempfile::TempDir) -> Config {
    ConfigBuilder::new()
        .user("alice")
        .storage_path(dir.path().join("history.json"))
        .build()
}

async fn exec(config: &Config, args: &[&str]) -> anyhow::Result<()> {
    let cli = Cli::try_parse_from(args)?;
    run(cli, config.clone()).await
}

#[tokio::test]
async fn import_organize_export() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);

    let transcript = dir.path().join("transcript.json");
    std::fs::write(
        &transcript,
        serde_json::json!({
            "platform": "claude",
            "model": "claude-3-opus-20240229",
            "title": "Trait objects",
            "messages": [
                { "role": "user", "content": "When should I use dyn Trait?" },
                { "role": "assistant", "content": "When the concrete type is only known at runtime.", "tokens": 12 }
            ]
        })
        .to_string(),
    )
    .unwrap();
    let transcript = transcript.to_string_lossy().to_string();

    exec(&config, &["chatvault", "import", &transcript]).await.unwrap();
    exec(&config, &["chatvault", "folders", "create", "Rust"]).await.unwrap();
    exec(&config, &["chatvault", "tags", "create", "types"]).await.unwrap();
    exec(&config, &["chatvault", "conversations", "move", "1", "1"]).await.unwrap();
    exec(&config, &["chatvault", "conversations", "tag", "1", "1"]).await.unwrap();

    let vault = ChatVault::open(&config).await.unwrap();
    let conversation = vault
        .history()
        .get_conversation(vault.owner(), chatvault_core::ConversationId::new(1))
        .await
        .unwrap();
    assert_eq!(conversation.platform, chatvault_core::Platform::Anthropic);
    assert_eq!(conversation.folder_id, Some(chatvault_core::FolderId::new(1)));
    assert_eq!(conversation.tag_ids, vec![chatvault_core::TagId::new(1)]);

    let hits = vault.semantic_search("use dyn Trait", Some(1)).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].conversation_title.as_deref(), Some("Trait objects"));
    drop(vault);

    let out_dir = dir.path().to_string_lossy().to_string();
    exec(
        &config,
        &["chatvault", "export", "conversation", "1", "--format", "md", "--output", &out_dir],
    )
    .await
    .unwrap();
    let markdown = std::fs::read_to_string(dir.path().join("conversation_1.md")).unwrap();
    assert!(markdown.starts_with("# Trait objects"));
    assert!(markdown.contains("When should I use dyn Trait?"));

    let csv_bulk = exec(
        &config,
        &["chatvault", "export", "bulk", "1", "--format", "csv", "--output", &out_dir],
    )
    .await;
    assert!(csv_bulk.is_err());
}

#[tokio::test]
async fn missing_conversation_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    assert!(exec(&config, &["chatvault", "conversations", "show", "42"]).await.is_err());
}

#[tokio::test]
async fn keys_set_then_toggle() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);

    exec(&config, &["chatvault", "keys", "set", "openai", "sk-abcdefghijklmnop"])
        .await
        .unwrap();
    exec(&config, &["chatvault", "keys", "toggle", "1"]).await.unwrap();

    let vault = ChatVault::open(&config).await.unwrap();
    let keys = vault.history().list_api_keys(vault.owner()).await.unwrap();
    assert_eq!(keys.len(), 1);
    assert!(!keys[0].is_active);
    assert_eq!(keys[0].masked_key, "sk-...mnop");
}
