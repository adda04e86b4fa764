mod answer;
mod chain;
mod condenser;
mod retriever;

pub use answer::{AnswerGenerator, AnswerStream};
pub use chain::{ConversationalRetrievalChain, PipelineStage, PreparedAnswer};
pub use condenser::QuestionCondenser;
pub use retriever::DocumentRetriever;

#[cfg(test)]
pub(crate) mod testing;
