use async_trait::async_trait;
use std::sync::RwLock;

use crate::domain::{ports::VectorStore, DocumentFragment, DomainError, Embedding, SearchResult};

/// Brute-force cosine search over fragments held in memory.
pub struct InMemoryVectorStore {
    fragments: RwLock<Vec<(DocumentFragment, Embedding)>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            fragments: RwLock::new(Vec::new()),
        }
    }

    pub fn insert(&self, fragment: DocumentFragment, embedding: Embedding) -> Result<(), DomainError> {
        let mut store = self
            .fragments
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        store.push((fragment, embedding));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.fragments.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let store = self
            .fragments
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let mut results: Vec<SearchResult> = store
            .iter()
            .map(|(fragment, embedding)| SearchResult {
                fragment: fragment.clone(),
                score: query.cosine_similarity(embedding),
            })
            .collect();

        // stable sort keeps insertion order among equal scores
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);

        Ok(results)
    }
}
