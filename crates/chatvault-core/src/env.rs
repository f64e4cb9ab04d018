//! Environment variable handling.

use std::env;

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
pub fn get_var_or(name: &str, default: &str) -> String {
    get_var(name).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable as a boolean.
pub fn get_bool(name: &str) -> bool {
    get_var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Get an environment variable as a usize.
pub fn get_usize(name: &str) -> Option<usize> {
    get_var(name).and_then(|v| v.parse().ok())
}

/// Load environment variables from a `.env` file in the working directory.
///
/// Variables that are already set are left untouched.
pub fn load_dotenv() -> Result<(), std::io::Error> {
    let path = std::path::Path::new(".env");
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        for (key, value) in parse_dotenv(&content) {
            if env::var(&key).is_err() {
                env::set_var(key, value);
            }
        }
    }
    Ok(())
}

/// Parse `KEY=value` lines, skipping comments and stripping matching quotes.
pub fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim().trim_start_matches("export ").trim();
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            if !key.is_empty() {
                pairs.push((key.to_string(), value.to_string()));
            }
        }
    }
    pairs
}

/// Environment variable names read by ChatVault.
pub mod vars {
    /// API key for OpenAI embeddings.
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

    /// ChatVault home directory override.
    pub const CHATVAULT_HOME: &str = "CHATVAULT_HOME";

    /// ChatVault config file override.
    pub const CHATVAULT_CONFIG: &str = "CHATVAULT_CONFIG";

    /// Owner id override.
    pub const CHATVAULT_USER: &str = "CHATVAULT_USER";

    /// Log filter override (falls back to `RUST_LOG`).
    pub const CHATVAULT_LOG: &str = "CHATVAULT_LOG";

    /// Vector backend: `pinecone`, `qdrant` or `in_process`.
    pub const VECTOR_SEARCH_PROVIDER: &str = "VECTOR_SEARCH_PROVIDER";

    pub const PINECONE_API_KEY: &str = "PINECONE_API_KEY";
    pub const PINECONE_ENVIRONMENT: &str = "PINECONE_ENVIRONMENT";
    pub const PINECONE_INDEX_NAME: &str = "PINECONE_INDEX_NAME";
    pub const PINECONE_INDEX_HOST: &str = "PINECONE_INDEX_HOST";

    pub const QDRANT_URL: &str = "QDRANT_URL";
    pub const QDRANT_API_KEY: &str = "QDRANT_API_KEY";

    /// Embedding model name.
    pub const EMBEDDING_MODEL: &str = "EMBEDDING_MODEL";
}
