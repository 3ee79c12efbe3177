//! VectorStore trait — abstract interface for the document index.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// A stored document passage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPassage {
    /// Unique passage identifier.
    pub passage_id: String,
    /// The text content.
    pub content: String,
    /// Source identifier (document name, URL, etc.).
    pub source: String,
    /// Optional metadata (JSON).
    pub metadata: Option<serde_json::Value>,
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassageSearchResult {
    pub passage: StoredPassage,
    /// Cosine similarity (higher = better).
    pub score: f32,
}

/// Abstract trait for the passage index.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert a passage with its embedding vector.
    async fn insert(&self, passage: StoredPassage, embedding: Vec<f32>) -> Result<(), ApiError>;

    /// Insert multiple passages in one transaction.
    async fn insert_batch(
        &self,
        items: Vec<(StoredPassage, Vec<f32>)>,
    ) -> Result<(), ApiError>;

    /// Top `limit` passages by similarity to the query embedding,
    /// descending score.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<PassageSearchResult>, ApiError>;

    /// Total stored passage count.
    async fn count(&self) -> Result<usize, ApiError>;

    /// Drop all passages and record the embedding model the new index is
    /// built with. Used when the embedding model changes and every stored
    /// vector is invalidated.
    async fn reset(&self, embedding_model: &str) -> Result<(), ApiError>;
}
