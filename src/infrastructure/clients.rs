use std::sync::Arc;

use crate::application::{
    AnswerGenerator, ConversationalRetrievalChain, DocumentRetriever, QuestionCondenser,
};
use crate::domain::{
    ports::{EmbeddingService, LlmService, VectorStore},
    DomainError,
};
use crate::infrastructure::config::{AppConfig, VectorStoreProvider};
use crate::infrastructure::{
    openai_client, OpenAiLlm, QdrantVectorStore, SupabaseVectorStore, TextEmbedding,
};

/// Builds the pipeline and its upstream clients once; the result is shared by
/// every request.
pub fn build_chain(app: &AppConfig) -> Result<ConversationalRetrievalChain, DomainError> {
    let cfg = &app.config;
    let http = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| DomainError::internal(format!("failed to build HTTP client: {e}")))?;

    let openai = openai_client(http.clone(), &cfg.llm)?;
    let llm: Arc<dyn LlmService> = Arc::new(OpenAiLlm::new(&openai, &cfg.llm));
    let embedding: Arc<dyn EmbeddingService> =
        Arc::new(TextEmbedding::from_config(&openai, &cfg.embedding));
    let vector_store = build_vector_store(app, http)?;

    let condenser = QuestionCondenser::new(llm.clone(), app.condense_template().map_err(to_domain)?)?;
    let generator = AnswerGenerator::new(llm, app.answer_template().map_err(to_domain)?)?;
    let retriever = DocumentRetriever::new(embedding, vector_store, cfg.rag.top_k);

    tracing::info!(
        model = %cfg.llm.model,
        embedding_model = %cfg.embedding.model,
        vector_store = ?cfg.vector_store.provider,
        top_k = cfg.rag.top_k,
        "retrieval chain ready"
    );

    Ok(ConversationalRetrievalChain::new(condenser, retriever, generator)
        .with_separator(cfg.rag.document_separator.clone()))
}

fn build_vector_store(
    app: &AppConfig,
    http: reqwest::Client,
) -> Result<Arc<dyn VectorStore>, DomainError> {
    let store = &app.config.vector_store;
    let vector_store: Arc<dyn VectorStore> = match store.provider {
        VectorStoreProvider::Supabase => {
            Arc::new(SupabaseVectorStore::from_config(http, &store.supabase)?)
        }
        VectorStoreProvider::Qdrant => Arc::new(QdrantVectorStore::from_config(&store.qdrant)?),
    };
    Ok(vector_store)
}

fn to_domain(e: crate::infrastructure::config::ConfigError) -> DomainError {
    DomainError::validation(e.to_string())
}
