use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use rig::agent::{Agent, MultiTurnStreamItem, StreamingError};
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::openai;
use rig::streaming::{StreamedAssistantContent, StreamingPrompt};

use crate::domain::{
    ports::{LlmService, TextStream},
    DomainError,
};
use crate::infrastructure::config::LlmConfig;

/// Builds the OpenAI Chat Completions client shared by the chat model and the
/// embeddings. `base_url` may point at any OpenAI-compatible gateway.
pub fn openai_client(
    http: reqwest::Client,
    config: &LlmConfig,
) -> Result<openai::CompletionsClient, DomainError> {
    let api_key = config
        .api_key
        .as_deref()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| DomainError::validation("OpenAI API key is required (OPENAI_API_KEY)"))?;

    openai::CompletionsClient::<reqwest::Client>::builder()
        .api_key(api_key)
        .base_url(&config.base_url)
        .http_client(http)
        .build()
        .map_err(|e| DomainError::internal(format!("failed to build model client: {e}")))
}

/// Chat model behind an OpenAI-compatible endpoint, driven through a rig agent.
pub struct OpenAiLlm {
    agent: Agent<openai::CompletionModel>,
}

impl OpenAiLlm {
    pub fn new(client: &openai::CompletionsClient, config: &LlmConfig) -> Self {
        let mut builder = client.agent(&config.model);
        if let Some(temperature) = config.temperature {
            builder = builder.temperature(f64::from(temperature));
        }
        Self {
            agent: builder.build(),
        }
    }
}

#[async_trait]
impl LlmService for OpenAiLlm {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        self.agent
            .prompt(prompt)
            .await
            .map_err(|e| DomainError::external(format!("model request failed: {e}")))
    }

    /// Waits for the first text delta so that a request the model rejects
    /// fails here instead of inside the stream.
    async fn stream(&self, prompt: &str) -> Result<TextStream, DomainError> {
        let mut deltas = self
            .agent
            .stream_prompt(prompt)
            .await
            .filter_map(|item| futures::future::ready(text_delta(item)))
            .boxed();

        match deltas.next().await {
            Some(Err(e)) => Err(e),
            Some(Ok(first)) => {
                tracing::debug!("model stream opened");
                Ok(stream::once(futures::future::ready(Ok(first)))
                    .chain(deltas)
                    .boxed())
            }
            None => Ok(stream::empty().boxed()),
        }
    }
}

/// Keeps the assistant's text and drops everything else the agent reports
/// (reasoning, tool calls, usage).
fn text_delta<R>(
    item: Result<MultiTurnStreamItem<R>, StreamingError>,
) -> Option<Result<String, DomainError>> {
    match item {
        Ok(MultiTurnStreamItem::StreamAssistantItem(StreamedAssistantContent::Text(text))) => {
            Some(Ok(text.text))
        }
        Ok(_) => None,
        Err(e) => Some(Err(DomainError::external(format!("model stream failed: {e}")))),
    }
}
