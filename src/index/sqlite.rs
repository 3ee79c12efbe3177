//! SQLite-backed vector store.
//!
//! In-process index using SQLite for passage storage and brute-force
//! cosine similarity for search. Embeddings are stored as little-endian
//! f32 blobs.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{PassageSearchResult, StoredPassage, VectorStore};
use crate::core::config::AppPaths;
use crate::core::errors::ApiError;

pub struct SqliteVectorStore {
    pool: SqlitePool,
}

impl SqliteVectorStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, ApiError> {
        Self::with_path(paths.index_db_path.clone()).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS passages (
                passage_id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT '',
                metadata TEXT DEFAULT '{}',
                embedding BLOB,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }

    fn row_to_passage(row: &sqlx::sqlite::SqliteRow) -> StoredPassage {
        let metadata_str: String = row.get("metadata");
        let metadata = serde_json::from_str::<Value>(&metadata_str).ok();

        StoredPassage {
            passage_id: row.get("passage_id"),
            content: row.get("content"),
            source: row.get("source"),
            metadata,
        }
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn insert(&self, passage: StoredPassage, embedding: Vec<f32>) -> Result<(), ApiError> {
        self.insert_batch(vec![(passage, embedding)]).await
    }

    async fn insert_batch(
        &self,
        items: Vec<(StoredPassage, Vec<f32>)>,
    ) -> Result<(), ApiError> {
        if items.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        for (passage, embedding) in &items {
            let blob = Self::serialize_embedding(embedding);
            let metadata_str = passage
                .metadata
                .as_ref()
                .map(|m| serde_json::to_string(m).unwrap_or_default())
                .unwrap_or_else(|| "{}".to_string());

            sqlx::query(
                "INSERT OR REPLACE INTO passages (passage_id, content, source, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&passage.passage_id)
            .bind(&passage.content)
            .bind(&passage.source)
            .bind(&metadata_str)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<PassageSearchResult>, ApiError> {
        let rows = sqlx::query(
            "SELECT passage_id, content, source, metadata, embedding FROM passages",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let mut scored: Vec<PassageSearchResult> = rows
            .iter()
            .filter_map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                if embedding_bytes.is_empty() {
                    return None;
                }
                let stored_emb = Self::deserialize_embedding(&embedding_bytes);
                let score = Self::cosine_similarity(query_embedding, &stored_emb);

                Some(PassageSearchResult {
                    passage: Self::row_to_passage(row),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);

        Ok(scored)
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM passages")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(count as usize)
    }

    async fn reset(&self, embedding_model: &str) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM passages")
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        sqlx::query(
            "INSERT OR REPLACE INTO index_meta (key, value, updated_at)
             VALUES ('embedding_model', ?1, STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))",
        )
        .bind(embedding_model)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteVectorStore {
        let tmp = std::env::temp_dir().join(format!("junu-index-test-{}.db", uuid::Uuid::new_v4()));
        SqliteVectorStore::with_path(tmp).await.unwrap()
    }

    fn make_passage(id: &str, content: &str, source: &str) -> StoredPassage {
        StoredPassage {
            passage_id: id.to_string(),
            content: content.to_string(),
            source: source.to_string(),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn insert_and_search() {
        let store = test_store().await;

        let passage = make_passage("p1", "नागरिकता प्रमाणपत्र", "citizenship.md");
        let embedding = vec![1.0, 0.0, 0.0];

        store.insert(passage, embedding.clone()).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);

        let results = store.search(&embedding, 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].passage.passage_id, "p1");
        assert!(results[0].score > 0.99);
    }

    #[tokio::test]
    async fn search_orders_by_similarity() {
        let store = test_store().await;

        store
            .insert_batch(vec![
                (make_passage("far", "a", "doc"), vec![0.0, 1.0, 0.0]),
                (make_passage("near", "b", "doc"), vec![0.9, 0.1, 0.0]),
                (make_passage("mid", "c", "doc"), vec![0.5, 0.5, 0.0]),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0, 0.0], 3).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.passage.passage_id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);
    }

    #[tokio::test]
    async fn search_respects_limit() {
        let store = test_store().await;

        store
            .insert_batch(vec![
                (make_passage("p1", "a", "doc"), vec![1.0, 0.0]),
                (make_passage("p2", "b", "doc"), vec![0.9, 0.1]),
                (make_passage("p3", "c", "doc"), vec![0.8, 0.2]),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);

        let none = store.search(&[1.0, 0.0], 0).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn reset_clears_passages_and_records_model() {
        let store = test_store().await;

        store
            .insert(make_passage("p1", "data", "doc"), vec![1.0])
            .await
            .unwrap();

        store.reset("text-embedding-3-small").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);

        let model: Option<String> =
            sqlx::query_scalar("SELECT value FROM index_meta WHERE key = 'embedding_model'")
                .fetch_optional(&store.pool)
                .await
                .unwrap();
        assert_eq!(model.as_deref(), Some("text-embedding-3-small"));
    }

    #[tokio::test]
    async fn mismatched_dimensions_score_zero() {
        let store = test_store().await;

        store
            .insert(make_passage("p1", "data", "doc"), vec![1.0, 0.0, 0.0])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 1).await.unwrap();
        assert_eq!(results[0].score, 0.0);
    }
}
