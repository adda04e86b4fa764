//! Prompt templates rendered with Handlebars.
//!
//! Placeholders are `{{name}}`. Output is never HTML-escaped, substituted
//! values are emitted as-is, and a literal `{{` is written `\{{`. Templates
//! are registered once in strict mode so a placeholder without a value is an
//! error rather than an empty string.

use std::collections::HashMap;

use handlebars::Handlebars;

use crate::domain::DomainError;

pub const CONDENSE_QUESTION_TEMPLATE: &str = "Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question, in its original language.

Chat History:
{{chat_history}}
Follow Up Input: {{question}}
Standalone question:";

pub const ANSWER_TEMPLATE: &str = "You are an energetic talking puppy named Dana, and must answer all questions like a happy, talking dog would.
Use lots of puns!

Answer the question based only on the following context:
{{context}}

Question: {{question}}
";

const TEMPLATE_NAME: &str = "prompt";

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    registry: Handlebars<'static>,
}

impl PromptTemplate {
    pub fn parse(template: &str) -> Result<Self, DomainError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(TEMPLATE_NAME, template)
            .map_err(|e| DomainError::validation(format!("invalid prompt template: {e}")))?;

        Ok(Self { registry })
    }

    /// Checks that every `required` variable appears in the rendered output
    /// and that the template needs nothing beyond them.
    pub fn require_variables(&self, required: &[&str]) -> Result<(), DomainError> {
        let markers: HashMap<&str, String> = required
            .iter()
            .map(|name| (*name, format!("\u{1}{name}\u{1}")))
            .collect();

        let rendered = self
            .registry
            .render(TEMPLATE_NAME, &markers)
            .map_err(|e| DomainError::validation(format!("prompt template cannot be rendered: {e}")))?;

        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|name| !rendered.contains(markers[name].as_str()))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DomainError::validation(format!(
                "prompt template is missing variables: {}",
                missing.join(", ")
            )))
        }
    }

    pub fn format(&self, values: &[(&str, &str)]) -> Result<String, DomainError> {
        let values: HashMap<&str, &str> = values.iter().copied().collect();
        self.registry
            .render(TEMPLATE_NAME, &values)
            .map_err(|e| DomainError::internal(format!("failed to render prompt: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_templates_declare_their_variables() {
        let condense = PromptTemplate::parse(CONDENSE_QUESTION_TEMPLATE).unwrap();
        assert!(condense.require_variables(&["chat_history", "question"]).is_ok());

        let answer = PromptTemplate::parse(ANSWER_TEMPLATE).unwrap();
        assert!(answer.require_variables(&["context", "question"]).is_ok());
    }

    #[test]
    fn test_format_substitutes_every_occurrence() {
        let template = PromptTemplate::parse("{{a}} and {{b}}, then {{a}} again").unwrap();
        let rendered = template.format(&[("a", "x"), ("b", "y")]).unwrap();
        assert_eq!(rendered, "x and y, then x again");
    }

    #[test]
    fn test_values_are_not_re_expanded_or_escaped() {
        let template = PromptTemplate::parse("Q: {{question}} C: {{context}}").unwrap();
        let rendered = template
            .format(&[("question", "what is {{context}} & <b>?"), ("context", "docs")])
            .unwrap();
        assert_eq!(rendered, "Q: what is {{context}} & <b>? C: docs");
    }

    #[test]
    fn test_empty_value_is_allowed() {
        let template = PromptTemplate::parse(CONDENSE_QUESTION_TEMPLATE).unwrap();
        let rendered = template
            .format(&[("chat_history", ""), ("question", "Hi?")])
            .unwrap();
        assert!(rendered.contains("Chat History:\n\nFollow Up Input: Hi?\n"));
    }

    #[test]
    fn test_escaped_braces() {
        let template = PromptTemplate::parse("literal \\{{braces}} then {{v}}").unwrap();
        assert_eq!(template.format(&[("v", "1")]).unwrap(), "literal {{braces}} then 1");
    }

    #[test]
    fn test_missing_value_is_an_error() {
        let template = PromptTemplate::parse("{{question}}").unwrap();
        let err = template.format(&[]).unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)));
    }

    #[test]
    fn test_malformed_template() {
        assert!(PromptTemplate::parse("{{#if question}}unclosed").is_err());
    }

    #[test]
    fn test_require_variables() {
        let template = PromptTemplate::parse("Question: {{question}}").unwrap();
        assert!(template.require_variables(&["question"]).is_ok());
        let err = template.require_variables(&["context", "question"]).unwrap_err();
        assert!(err.to_string().contains("context"));
    }

    #[test]
    fn test_unknown_variable_rejected() {
        let template = PromptTemplate::parse("{{question}} {{mood}}").unwrap();
        assert!(template.require_variables(&["question"]).is_err());
    }
}
