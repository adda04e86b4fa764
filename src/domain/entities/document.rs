use serde::{Deserialize, Serialize};

pub const DEFAULT_DOCUMENT_SEPARATOR: &str = "\n\n";

/// A piece of retrieved text. Owned by the external store, only borrowed here
/// for the lifetime of one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFragment {
    pub content: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl DocumentFragment {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub fragment: DocumentFragment,
    pub score: f32,
}

pub fn combine_documents(fragments: &[DocumentFragment]) -> String {
    combine_documents_with(fragments, DEFAULT_DOCUMENT_SEPARATOR)
}

/// Joins fragment contents with `separator`, keeping retrieval order.
pub fn combine_documents_with(fragments: &[DocumentFragment], separator: &str) -> String {
    fragments
        .iter()
        .map(|f| f.content.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}
