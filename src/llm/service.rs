use std::sync::Arc;

use super::provider::LlmProvider;
use super::types::ChatRequest;
use crate::core::config::ConfigService;
use crate::core::errors::ApiError;

/// Fronts the configured provider: resolves model names and sampling
/// settings from config before each call.
#[derive(Clone)]
pub struct LlmService {
    provider: Arc<dyn LlmProvider>,
    config: ConfigService,
}

impl LlmService {
    pub fn new(provider: Arc<dyn LlmProvider>, config: ConfigService) -> Self {
        Self { provider, config }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn health_check(&self) -> Result<bool, ApiError> {
        self.provider.health_check().await
    }

    /// Chat completion against the configured chat model.
    pub async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        let config = self.config.load_config()?;
        let model = config
            .get("chat")
            .and_then(|v| v.get("model"))
            .and_then(|v| v.as_str())
            .unwrap_or("gpt-4o-mini")
            .to_string();

        let request = request.with_config(&config);
        self.provider.chat(request, &model).await
    }

    /// Embeddings with the configured embedding model.
    pub async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        let model = self.embedding_model()?;
        self.provider.embed(inputs, &model).await
    }

    /// Embedding for a single query string.
    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>, ApiError> {
        let mut embeddings = self.embed(&[query.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| ApiError::Internal("Provider returned no embedding".to_string()))
    }

    pub fn embedding_model(&self) -> Result<String, ApiError> {
        let config = self.config.load_config()?;
        Ok(config
            .get("provider")
            .and_then(|v| v.get("embedding_model"))
            .and_then(|v| v.as_str())
            .unwrap_or("text-embedding-3-small")
            .to_string())
    }
}
