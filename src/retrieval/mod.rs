//! Query-time retrieval: embed the question, search the index, and build
//! the context block for the prompt.

use std::sync::Arc;

use serde_json::Value;

use crate::core::config::ConfigService;
use crate::core::errors::ApiError;
use crate::index::{PassageSearchResult, VectorStore};
use crate::llm::LlmService;

/// Shown to the model when nothing relevant was found.
pub const NO_RESULT_FALLBACK: &str = "सम्बन्धित परिणाम भेटिएन।";

/// Separator between retrieved passages in the context block.
const PASSAGE_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub score_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            score_threshold: 0.3,
        }
    }
}

impl RetrievalConfig {
    pub fn from_config(config: &Value) -> Self {
        let defaults = Self::default();
        let section = config.get("retrieval");
        Self {
            top_k: section
                .and_then(|v| v.get("top_k"))
                .and_then(|v| v.as_u64())
                .map(|v| v as usize)
                .unwrap_or(defaults.top_k),
            score_threshold: section
                .and_then(|v| v.get("score_threshold"))
                .and_then(|v| v.as_f64())
                .map(|v| v as f32)
                .unwrap_or(defaults.score_threshold),
        }
    }
}

#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    llm: LlmService,
    config: ConfigService,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStore>, llm: LlmService, config: ConfigService) -> Self {
        Self { store, llm, config }
    }

    /// The context block for a question: top-k passages joined with a
    /// separator, or the fixed fallback text when nothing scores above
    /// the relevance threshold.
    pub async fn retrieve_context(&self, question: &str) -> Result<String, ApiError> {
        let retrieval_config = RetrievalConfig::from_config(&self.config.load_config()?);

        let query_embedding = self.llm.embed_query(question).await?;
        let results = self
            .store
            .search(&query_embedding, retrieval_config.top_k)
            .await?;

        tracing::debug!(
            "Retrieved {} passages (best score: {:.3})",
            results.len(),
            results.first().map(|r| r.score).unwrap_or(0.0)
        );

        Ok(select_context(&results, &retrieval_config))
    }
}

/// Search results come back in descending score order, so checking the
/// first result is checking the best score.
pub fn select_context(results: &[PassageSearchResult], config: &RetrievalConfig) -> String {
    match results.first() {
        Some(best) if best.score >= config.score_threshold => results
            .iter()
            .map(|r| r.passage.content.as_str())
            .collect::<Vec<_>>()
            .join(PASSAGE_SEPARATOR),
        _ => NO_RESULT_FALLBACK.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::StoredPassage;

    fn result(content: &str, score: f32) -> PassageSearchResult {
        PassageSearchResult {
            passage: StoredPassage {
                passage_id: uuid::Uuid::new_v4().to_string(),
                content: content.to_string(),
                source: "doc".to_string(),
                metadata: None,
            },
            score,
        }
    }

    #[test]
    fn joins_passages_with_separator() {
        let results = vec![result("पहिलो", 0.9), result("दोस्रो", 0.5)];

        let context = select_context(&results, &RetrievalConfig::default());

        assert_eq!(context, "पहिलो\n\n---\n\nदोस्रो");
    }

    #[test]
    fn empty_results_fall_back() {
        let context = select_context(&[], &RetrievalConfig::default());
        assert_eq!(context, NO_RESULT_FALLBACK);
    }

    #[test]
    fn best_score_below_threshold_falls_back() {
        let results = vec![result("कम सान्दर्भिक", 0.2), result("अरू", 0.1)];

        let context = select_context(&results, &RetrievalConfig::default());

        assert_eq!(context, NO_RESULT_FALLBACK);
    }

    #[test]
    fn low_trailing_scores_do_not_trigger_fallback() {
        // Only the best score gates the result set.
        let results = vec![result("राम्रो", 0.8), result("कमजोर", 0.05)];

        let context = select_context(&results, &RetrievalConfig::default());

        assert!(context.contains("राम्रो"));
        assert!(context.contains("कमजोर"));
    }

    #[test]
    fn from_config_reads_retrieval_section() {
        let config = serde_json::json!({
            "retrieval": { "top_k": 7, "score_threshold": 0.5 }
        });

        let parsed = RetrievalConfig::from_config(&config);

        assert_eq!(parsed.top_k, 7);
        assert!((parsed.score_threshold - 0.5).abs() < f32::EPSILON);
    }
}
