use serde_json::{json, Value};

/// Built-in configuration. The public config file and the secrets overlay
/// are merged on top of this document.
pub fn default_config() -> Value {
    json!({
        "server": {
            "cors_allowed_origins": ["http://localhost:5173"]
        },
        "chat": {
            "model": "gpt-4o-mini",
            "history_limit": 5,
            "temperature": null,
            "max_tokens": null
        },
        "retrieval": {
            "top_k": 3,
            "score_threshold": 0.3
        },
        "ingest": {
            "chunk_size": 500,
            "chunk_overlap": 50
        },
        "provider": {
            "base_url": "https://api.openai.com",
            "api_key": null,
            "embedding_model": "text-embedding-3-small"
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_retrieval_settings() {
        let config = default_config();

        assert_eq!(config["retrieval"]["top_k"], 3);
        assert_eq!(config["retrieval"]["score_threshold"], 0.3);
        assert_eq!(config["chat"]["history_limit"], 5);
        assert_eq!(config["chat"]["model"], "gpt-4o-mini");
    }
}
