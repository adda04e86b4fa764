use async_trait::async_trait;
use rig::client::EmbeddingsClient;
use rig::embeddings::EmbeddingModel as _;
use rig::providers::openai;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};
use crate::infrastructure::config::EmbeddingConfig;

/// OpenAI embeddings through rig, on the client built at startup.
pub struct TextEmbedding {
    model: openai::EmbeddingModel,
    model_name: String,
    dimension: usize,
}

impl TextEmbedding {
    pub fn from_config(client: &openai::CompletionsClient, config: &EmbeddingConfig) -> Self {
        Self {
            model: client
                .clone()
                .responses_api()
                .embedding_model_with_ndims(&config.model, config.dimension),
            model_name: config.model.clone(),
            dimension: config.dimension,
        }
    }
}

#[async_trait]
impl EmbeddingService for TextEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        let embeddings = self
            .model
            .embed_texts(vec![text.to_string()])
            .await
            .map_err(|e| DomainError::external(format!("embedding request failed: {e}")))?;

        let embedding = embeddings
            .into_iter()
            .next()
            .map(|emb| Embedding::new(emb.vec.into_iter().map(|x| x as f32).collect()))
            .ok_or_else(|| DomainError::external("No embedding returned"))?;

        if embedding.dimension() != self.dimension {
            tracing::warn!(
                expected = self.dimension,
                actual = embedding.dimension(),
                model = %self.model_name,
                "embedding dimension differs from configuration"
            );
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
