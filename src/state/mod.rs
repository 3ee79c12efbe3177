use std::env;
use std::sync::Arc;

use crate::core::config::{AppPaths, ConfigService};
use crate::history::HistoryStore;
use crate::index::{SqliteVectorStore, VectorStore};
use crate::llm::openai::OpenAiProvider;
use crate::llm::LlmService;
use crate::retrieval::Retriever;

pub mod error;

use error::InitializationError;

/// Global application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub history: HistoryStore,
    pub vector_store: Arc<dyn VectorStore>,
    pub llm: LlmService,
    pub retriever: Retriever,
}

impl AppState {
    /// Initializes the application state:
    /// 1. Paths and configuration
    /// 2. History and index databases
    /// 3. The hosted-model provider
    pub async fn initialize() -> Result<Arc<Self>, InitializationError> {
        let paths = Arc::new(AppPaths::new());
        let config = ConfigService::new(paths.clone());

        let history = HistoryStore::new(paths.db_path.clone())
            .await
            .map_err(|e| InitializationError::History(e.into()))?;

        let vector_store: Arc<dyn VectorStore> = Arc::new(
            SqliteVectorStore::new(paths.as_ref())
                .await
                .map_err(|e| InitializationError::Index(e.into()))?,
        );

        let provider = build_provider(&config);
        let llm = LlmService::new(Arc::new(provider), config.clone());
        let retriever = Retriever::new(vector_store.clone(), llm.clone(), config.clone());

        Ok(Arc::new(AppState {
            paths,
            config,
            history,
            vector_store,
            llm,
            retriever,
        }))
    }
}

/// Provider settings come from the `provider` config section; the API key
/// may instead be supplied via `OPENAI_API_KEY`.
///
/// The endpoint and key are fixed at startup: changing them through
/// `/api/config` takes effect on the next restart. Model names are read
/// from config on every call.
fn build_provider(config: &ConfigService) -> OpenAiProvider {
    let loaded = config.load_config().unwrap_or(serde_json::Value::Null);
    let section = loaded.get("provider");

    let base_url = section
        .and_then(|v| v.get("base_url"))
        .and_then(|v| v.as_str())
        .unwrap_or("https://api.openai.com")
        .to_string();

    let api_key = section
        .and_then(|v| v.get("api_key"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .or_else(|| env::var("OPENAI_API_KEY").ok())
        .filter(|key| !key.trim().is_empty());

    if api_key.is_none() {
        tracing::warn!("No provider API key configured; model calls will fail");
    }

    OpenAiProvider::new(base_url, api_key)
}
