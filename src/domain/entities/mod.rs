mod conversation;
mod document;
mod embedding;

pub use conversation::{format_chat_history, ChatMessage, ConversationalQuery, MessageRole};
pub use document::{
    combine_documents, combine_documents_with, DocumentFragment, SearchResult,
    DEFAULT_DOCUMENT_SEPARATOR,
};
pub use embedding::Embedding;
