//! Application layer - Use cases and orchestration.
//!
//! This module contains application services that orchestrate domain logic
//! and infrastructure. Services depend on domain ports (traits) rather than
//! concrete implementations.

pub mod prompts;
pub mod services;

pub use prompts::PromptTemplate;
pub use services::{
    AnswerGenerator, AnswerStream, ConversationalRetrievalChain, DocumentRetriever,
    PipelineStage, PreparedAnswer, QuestionCondenser,
};
