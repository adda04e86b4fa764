//! Scripted ports for service tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::domain::{
    ports::{EmbeddingService, LlmService, TextStream, VectorStore},
    DocumentFragment, DomainError, Embedding, SearchResult,
};

pub struct ScriptedLlm {
    completion: String,
    tokens: Vec<String>,
    fail: bool,
    fail_stream_after: Option<usize>,
    completed: Mutex<Vec<String>>,
    streamed: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(completion: &str, tokens: &[&str]) -> Self {
        Self {
            completion: completion.to_string(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            fail: false,
            fail_stream_after: None,
            completed: Mutex::new(Vec::new()),
            streamed: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("", &[])
        }
    }

    pub fn fail_stream_after(mut self, tokens: usize) -> Self {
        self.fail_stream_after = Some(tokens);
        self
    }

    pub fn completed_prompts(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }

    pub fn streamed_prompts(&self) -> Vec<String> {
        self.streamed.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        self.completed.lock().unwrap().push(prompt.to_string());
        if self.fail {
            return Err(DomainError::external("model unavailable"));
        }
        Ok(self.completion.clone())
    }

    async fn stream(&self, prompt: &str) -> Result<TextStream, DomainError> {
        self.streamed.lock().unwrap().push(prompt.to_string());
        if self.fail {
            return Err(DomainError::external("model unavailable"));
        }

        let mut items: Vec<Result<String, DomainError>> = match self.fail_stream_after {
            Some(n) => self.tokens.iter().take(n).cloned().map(Ok).collect(),
            None => self.tokens.iter().cloned().map(Ok).collect(),
        };
        if self.fail_stream_after.is_some() {
            items.push(Err(DomainError::external("stream reset")));
            items.push(Ok("after error".to_string()));
        }

        Ok(stream::iter(items).boxed())
    }
}

/// Returns its fragments in insertion order regardless of the query.
pub struct FixedVectorStore {
    fragments: Vec<DocumentFragment>,
    calls: AtomicUsize,
    last_top_k: Mutex<Option<usize>>,
}

impl FixedVectorStore {
    pub fn new(contents: &[&str]) -> Self {
        Self {
            fragments: contents.iter().map(|c| DocumentFragment::new(*c)).collect(),
            calls: AtomicUsize::new(0),
            last_top_k: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_top_k(&self) -> Option<usize> {
        *self.last_top_k.lock().unwrap()
    }
}

#[async_trait]
impl VectorStore for FixedVectorStore {
    async fn search(&self, _query: &Embedding, top_k: usize) -> Result<Vec<SearchResult>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_top_k.lock().unwrap() = Some(top_k);

        Ok(self
            .fragments
            .iter()
            .take(top_k)
            .enumerate()
            .map(|(i, fragment)| SearchResult {
                fragment: fragment.clone(),
                score: 1.0 - i as f32 * 0.1,
            })
            .collect())
    }
}

pub struct FailingVectorStore;

#[async_trait]
impl VectorStore for FailingVectorStore {
    async fn search(&self, _query: &Embedding, _top_k: usize) -> Result<Vec<SearchResult>, DomainError> {
        Err(DomainError::external("vector store unreachable"))
    }
}

/// Deterministic bag-of-bytes embedding.
pub struct HashEmbedding {
    dimension: usize,
}

impl HashEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl EmbeddingService for HashEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        let mut vec = vec![0.0f32; self.dimension];
        for (i, b) in text.bytes().enumerate() {
            vec[(b as usize + i) % self.dimension] += 1.0;
        }
        Ok(Embedding::new(vec))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
