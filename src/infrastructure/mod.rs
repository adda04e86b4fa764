pub mod clients;
pub mod config;
pub mod embedding;
pub mod llm;
pub mod vector_store;

pub use clients::build_chain;
pub use config::{AppConfig, Config, ConfigError, PromptsConfig};
pub use embedding::TextEmbedding;
pub use llm::{openai_client, OpenAiLlm};
pub use vector_store::{InMemoryVectorStore, QdrantVectorStore, SupabaseVectorStore};
