use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::history::DEFAULT_SESSION_ID;
use crate::llm::{ChatMessage, ChatRequest};
use crate::prompt::build_prompt;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UserInput {
    pub question: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
}

/// The question-answering pipeline: embed the question, search the index,
/// assemble the prompt with recent history, call the chat model, and
/// record the turn.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UserInput>,
) -> Result<impl IntoResponse, ApiError> {
    let question = payload.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest("question cannot be empty".to_string()));
    }

    let session_id = payload
        .session_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or(DEFAULT_SESSION_ID)
        .to_string();

    let context = state.retriever.retrieve_context(question).await?;

    let history_limit = extract_history_limit(&state.config.load_config()?);
    let turns = state
        .history
        .get_recent_turns(&session_id, history_limit)
        .await?;

    let prompt = build_prompt(&turns, question, &context);

    let request = ChatRequest::new(vec![ChatMessage::user(prompt)]);
    let answer = state.llm.chat(request).await?;

    state.history.add_turn(&session_id, question, &answer).await?;

    tracing::info!(session = %session_id, "Answered chat question");

    Ok(Json(ChatResponse { answer }))
}

fn extract_history_limit(config: &serde_json::Value) -> i64 {
    config
        .get("chat")
        .and_then(|v| v.get("history_limit"))
        .and_then(|v| v.as_i64())
        .unwrap_or(5)
}
