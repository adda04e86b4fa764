use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use tracing::instrument;

use crate::application::prompts::{PromptTemplate, ANSWER_TEMPLATE};
use crate::domain::{ports::LlmService, DomainError};

/// Answer text as UTF-8 byte chunks, ready to be written to a response body.
pub type AnswerStream = BoxStream<'static, Result<Bytes, DomainError>>;

pub struct AnswerGenerator {
    llm: Arc<dyn LlmService>,
    template: PromptTemplate,
}

impl AnswerGenerator {
    pub const VARIABLES: [&'static str; 2] = ["context", "question"];

    pub fn new(llm: Arc<dyn LlmService>, template: PromptTemplate) -> Result<Self, DomainError> {
        template.require_variables(&Self::VARIABLES)?;
        Ok(Self { llm, template })
    }

    pub fn with_default_prompt(llm: Arc<dyn LlmService>) -> Result<Self, DomainError> {
        Self::new(llm, PromptTemplate::parse(ANSWER_TEMPLATE)?)
    }

    pub fn build_prompt(&self, context: &str, question: &str) -> Result<String, DomainError> {
        self.template
            .format(&[("context", context), ("question", question)])
    }

    /// Starts the model stream. Nothing is buffered: each model delta becomes
    /// one chunk, empty deltas are dropped.
    #[instrument(skip(self, context), fields(context_len = context.len()))]
    pub async fn generate(&self, context: &str, question: &str) -> Result<AnswerStream, DomainError> {
        let prompt = self.build_prompt(context, question)?;
        let tokens = self.llm.stream(&prompt).await?;

        Ok(tokens
            .filter(|item| futures::future::ready(!matches!(item, Ok(text) if text.is_empty())))
            .map(|item| item.map(Bytes::from))
            .boxed())
    }
}
