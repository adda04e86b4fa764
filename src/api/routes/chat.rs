use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::api::{error::ApiError, state::AppState};
use crate::domain::{ChatMessage, ConversationalQuery};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// POST /api/chat/retrieval
///
/// Answers the last message using the earlier ones as conversation history.
/// The answer is streamed as plain text; all failures up to the first chunk
/// come back as an error status instead.
pub async fn retrieval_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    tracing::Span::current().record("messages", request.messages.len());
    tracing::info!("chat request");

    let query = ConversationalQuery::from_messages(request.messages)?;
    let answer = state.chain.stream(query).await?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(answer),
    )
        .into_response())
}
