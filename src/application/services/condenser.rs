use std::sync::Arc;
use tracing::instrument;

use crate::application::prompts::{PromptTemplate, CONDENSE_QUESTION_TEMPLATE};
use crate::domain::{ports::LlmService, DomainError};

/// Rewrites a follow-up question into one that stands on its own.
pub struct QuestionCondenser {
    llm: Arc<dyn LlmService>,
    template: PromptTemplate,
}

impl QuestionCondenser {
    pub const VARIABLES: [&'static str; 2] = ["chat_history", "question"];

    pub fn new(llm: Arc<dyn LlmService>, template: PromptTemplate) -> Result<Self, DomainError> {
        template.require_variables(&Self::VARIABLES)?;
        Ok(Self { llm, template })
    }

    pub fn with_default_prompt(llm: Arc<dyn LlmService>) -> Result<Self, DomainError> {
        Self::new(llm, PromptTemplate::parse(CONDENSE_QUESTION_TEMPLATE)?)
    }

    pub fn build_prompt(&self, chat_history: &str, question: &str) -> Result<String, DomainError> {
        self.template
            .format(&[("chat_history", chat_history), ("question", question)])
    }

    #[instrument(skip(self, chat_history), fields(history_len = chat_history.len()))]
    pub async fn condense(&self, chat_history: &str, question: &str) -> Result<String, DomainError> {
        let prompt = self.build_prompt(chat_history, question)?;
        let standalone = self.llm.complete(&prompt).await?;
        Ok(standalone.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::testing::ScriptedLlm;

    #[tokio::test]
    async fn test_condense_embeds_history_and_question() {
        let llm = Arc::new(ScriptedLlm::new("  Do dogs like bones?\n", &[]));
        let condenser = QuestionCondenser::with_default_prompt(llm.clone()).unwrap();

        let standalone = condenser
            .condense("Human: Tell me about dogs\nAssistant: Woof!", "Do they like bones?")
            .await
            .unwrap();

        assert_eq!(standalone, "Do dogs like bones?");

        let prompts = llm.completed_prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Chat History:\nHuman: Tell me about dogs\nAssistant: Woof!\n"));
        assert!(prompts[0].contains("Follow Up Input: Do they like bones?\n"));
        assert!(prompts[0].ends_with("Standalone question:"));
    }

    #[tokio::test]
    async fn test_condense_propagates_model_error() {
        let llm = Arc::new(ScriptedLlm::failing());
        let condenser = QuestionCondenser::with_default_prompt(llm).unwrap();

        let err = condenser.condense("", "hi").await.unwrap_err();
        assert!(matches!(err, DomainError::ExternalService(_)));
    }

    #[test]
    fn test_rejects_template_without_history() {
        let llm = Arc::new(ScriptedLlm::new("", &[]));
        let template = PromptTemplate::parse("Rephrase: {{question}}").unwrap();
        assert!(QuestionCondenser::new(llm, template).is_err());
    }
}
