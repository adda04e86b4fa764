use std::sync::Arc;
use tracing::instrument;

use crate::domain::{
    ports::{EmbeddingService, VectorStore},
    DocumentFragment, DomainError, SearchResult,
};

/// Embeds a query and looks it up in the vector index.
pub struct DocumentRetriever {
    embedding: Arc<dyn EmbeddingService>,
    vector_store: Arc<dyn VectorStore>,
    default_top_k: usize,
}

impl DocumentRetriever {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        vector_store: Arc<dyn VectorStore>,
        default_top_k: usize,
    ) -> Self {
        Self {
            embedding,
            vector_store,
            default_top_k,
        }
    }

    /// Fragments for `query`, best match first.
    #[instrument(skip(self), fields(top_k = self.default_top_k))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<DocumentFragment>, DomainError> {
        let results = self.retrieve_top_k(query, self.default_top_k).await?;
        Ok(results.into_iter().map(|r| r.fragment).collect())
    }

    #[instrument(skip(self))]
    pub async fn retrieve_top_k(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let embedding = self.embedding.embed(query).await?;
        let results = self.vector_store.search(&embedding, top_k).await?;
        tracing::debug!(count = results.len(), "retrieved fragments");
        Ok(results)
    }
}
