use crate::domain::{errors::DomainError, Embedding, SearchResult};
use async_trait::async_trait;

/// Read side of a similarity index. Results are ordered best match first.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError>;
}
