use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::index::{split_into_chunks, ChunkerConfig, StoredPassage};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub text: String,
    pub source: String,
}

/// Split a document into passages, embed them, and add them to the index.
pub async fn ingest_document(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<IngestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text cannot be empty".to_string()));
    }
    if payload.source.trim().is_empty() {
        return Err(ApiError::BadRequest("source cannot be empty".to_string()));
    }

    let chunker_config = extract_chunker_config(&state.config.load_config()?);
    let chunks = split_into_chunks(&payload.text, &payload.source, &chunker_config);
    if chunks.is_empty() {
        return Err(ApiError::BadRequest(
            "text produced no indexable passages".to_string(),
        ));
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let embeddings = state.llm.embed(&texts).await?;

    let items: Vec<(StoredPassage, Vec<f32>)> = chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| {
            (
                StoredPassage {
                    passage_id: uuid::Uuid::new_v4().to_string(),
                    content: chunk.text,
                    source: chunk.source,
                    metadata: Some(json!({
                        "start_offset": chunk.start_offset,
                        "chunk_index": chunk.chunk_index
                    })),
                },
                embedding,
            )
        })
        .collect();

    let inserted = items.len();
    state.vector_store.insert_batch(items).await?;

    tracing::info!(source = %payload.source, passages = inserted, "Indexed document");

    Ok(Json(json!({"indexed_passages": inserted})))
}

pub async fn count_documents(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let count = state.vector_store.count().await?;
    Ok(Json(json!({"indexed_passages": count})))
}

/// Drop the whole index. Required when the embedding model changes, since
/// stored vectors from different models are not comparable.
pub async fn reset_index(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let embedding_model = state.llm.embedding_model()?;
    state.vector_store.reset(&embedding_model).await?;
    Ok(Json(json!({"status": "reset", "embedding_model": embedding_model})))
}

fn extract_chunker_config(config: &serde_json::Value) -> ChunkerConfig {
    let defaults = ChunkerConfig::default();
    let section = config.get("ingest");
    ChunkerConfig {
        chunk_size: section
            .and_then(|v| v.get("chunk_size"))
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(defaults.chunk_size),
        chunk_overlap: section
            .and_then(|v| v.get("chunk_overlap"))
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(defaults.chunk_overlap),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extract_chunker_config_reads_ingest_section() {
        let config = json!({ "ingest": { "chunk_size": 200, "chunk_overlap": 10 } });

        let parsed = extract_chunker_config(&config);

        assert_eq!(parsed.chunk_size, 200);
        assert_eq!(parsed.chunk_overlap, 10);
    }

    #[test]
    fn extract_chunker_config_defaults_when_missing() {
        let parsed = extract_chunker_config(&json!({}));

        assert_eq!(parsed.chunk_size, 500);
        assert_eq!(parsed.chunk_overlap, 50);
    }
}
