use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn health(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok"
    }))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let total_messages = state.history.get_total_message_count().await.unwrap_or(0);
    let indexed_passages = state.vector_store.count().await.unwrap_or(0);
    let provider_healthy = state.llm.health_check().await.unwrap_or(false);

    Ok(Json(json!({
        "provider": state.llm.provider_name(),
        "provider_healthy": provider_healthy,
        "total_messages": total_messages,
        "indexed_passages": indexed_passages
    })))
}
