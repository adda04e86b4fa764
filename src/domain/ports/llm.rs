use crate::domain::errors::DomainError;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Incremental model output, in the order the model produced it.
pub type TextStream = BoxStream<'static, Result<String, DomainError>>;

#[async_trait]
pub trait LlmService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError>;

    /// Starts a streamed completion. Errors that happen before the first token
    /// (connection, auth, bad status) are returned here, later ones in the stream.
    async fn stream(&self, prompt: &str) -> Result<TextStream, DomainError>;
}
