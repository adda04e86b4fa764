mod openai;

pub use openai::{openai_client, OpenAiLlm};
