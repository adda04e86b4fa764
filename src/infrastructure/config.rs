use serde::Deserialize;
use std::path::Path;

use crate::application::{
    prompts::{ANSWER_TEMPLATE, CONDENSE_QUESTION_TEMPLATE},
    AnswerGenerator, PromptTemplate, QuestionCondenser,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";
pub const DEFAULT_PROMPTS_PATH: &str = "config/prompts.yaml";

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub vector_store: VectorStoreConfig,
    pub rag: RagConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreProvider {
    #[default]
    Supabase,
    Qdrant,
}

impl std::str::FromStr for VectorStoreProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "supabase" => Ok(Self::Supabase),
            "qdrant" => Ok(Self::Qdrant),
            other => Err(ConfigError::Invalid(format!(
                "unknown vector store provider '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub provider: VectorStoreProvider,
    pub supabase: SupabaseConfig,
    pub qdrant: QdrantConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub query_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
    pub content_field: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub top_k: usize,
    pub document_separator: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub condense_question: String,
    pub answer: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            temperature: None,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-ada-002".to_string(),
            dimension: 1536,
        }
    }
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: None,
            query_name: "match_documents".to_string(),
        }
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            api_key: None,
            collection: "documents".to_string(),
            content_field: "content".to_string(),
        }
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            document_separator: "\n\n".to_string(),
        }
    }
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            condense_question: CONDENSE_QUESTION_TEMPLATE.to_string(),
            answer: ANSWER_TEMPLATE.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads YAML files (falling back to defaults when absent), applies
    /// environment overrides and validates the result.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let prompts_path =
            std::env::var("PROMPTS_PATH").unwrap_or_else(|_| DEFAULT_PROMPTS_PATH.into());

        let mut app = Self {
            config: read_yaml_or_default(&config_path)?,
            prompts: read_yaml_or_default(&prompts_path)?,
        };
        app.apply_overrides(|key| std::env::var(key).ok())?;
        app.validate()?;
        Ok(app)
    }

    pub fn from_yaml(config: &str, prompts: Option<&str>) -> Result<Self, ConfigError> {
        let parse = |path: &str, source| ConfigError::Parse {
            path: path.to_string(),
            source,
        };
        Ok(Self {
            config: serde_yaml::from_str(config).map_err(|e| parse("<config>", e))?,
            prompts: match prompts {
                Some(p) => serde_yaml::from_str(p).map_err(|e| parse("<prompts>", e))?,
                None => PromptsConfig::default(),
            },
        })
    }

    /// Applies environment-style overrides. `lookup` returns the value of a
    /// variable, if set.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cfg = &mut self.config;

        if let Some(host) = lookup("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            cfg.server.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("SERVER_PORT '{port}' is not a port")))?;
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            cfg.llm.api_key = Some(key);
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            cfg.llm.base_url = url;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            cfg.llm.model = model;
        }
        if let Some(provider) = lookup("VECTOR_STORE_PROVIDER") {
            cfg.vector_store.provider = provider.parse()?;
        }
        if let Some(url) = lookup("SUPABASE_URL") {
            cfg.vector_store.supabase.url = url;
        }
        if let Some(key) = lookup("SUPABASE_PRIVATE_KEY") {
            cfg.vector_store.supabase.api_key = Some(key);
        }
        if let Some(url) = lookup("QDRANT_URL") {
            cfg.vector_store.qdrant.url = url;
        }
        if let Some(key) = lookup("QDRANT_API_KEY") {
            cfg.vector_store.qdrant.api_key = Some(key);
        }
        if let Some(top_k) = lookup("RAG_TOP_K") {
            cfg.rag.top_k = top_k
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("RAG_TOP_K '{top_k}' is not a number")))?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let cfg = &self.config;

        if cfg.llm.model.trim().is_empty() {
            return Err(ConfigError::Invalid("llm.model must not be empty".into()));
        }
        if cfg.llm.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "OpenAI API key is required (OPENAI_API_KEY)".into(),
            ));
        }
        if cfg.embedding.model.trim().is_empty() {
            return Err(ConfigError::Invalid("embedding.model must not be empty".into()));
        }
        if cfg.rag.top_k == 0 {
            return Err(ConfigError::Invalid("rag.top_k must be at least 1".into()));
        }

        match cfg.vector_store.provider {
            VectorStoreProvider::Supabase => {
                let supabase = &cfg.vector_store.supabase;
                if supabase.url.trim().is_empty() {
                    return Err(ConfigError::Invalid(
                        "Supabase URL is required (SUPABASE_URL)".into(),
                    ));
                }
                if supabase.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
                    return Err(ConfigError::Invalid(
                        "Supabase key is required (SUPABASE_PRIVATE_KEY)".into(),
                    ));
                }
            }
            VectorStoreProvider::Qdrant => {
                if cfg.vector_store.qdrant.url.trim().is_empty() {
                    return Err(ConfigError::Invalid(
                        "Qdrant URL is required (QDRANT_URL)".into(),
                    ));
                }
            }
        }

        self.condense_template()?;
        self.answer_template()?;
        Ok(())
    }

    pub fn condense_template(&self) -> Result<PromptTemplate, ConfigError> {
        parse_template(&self.prompts.condense_question, &QuestionCondenser::VARIABLES)
    }

    pub fn answer_template(&self) -> Result<PromptTemplate, ConfigError> {
        parse_template(&self.prompts.answer, &AnswerGenerator::VARIABLES)
    }
}

fn parse_template(source: &str, required: &[&str]) -> Result<PromptTemplate, ConfigError> {
    let template =
        PromptTemplate::parse(source).map_err(|e| ConfigError::Invalid(e.to_string()))?;
    template
        .require_variables(required)
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;
    Ok(template)
}

fn read_yaml_or_default<T>(path: &str) -> Result<T, ConfigError>
where
    T: serde::de::DeserializeOwned + Default,
{
    if !Path::new(path).exists() {
        tracing::debug!(path, "config file not found, using defaults");
        return Ok(T::default());
    }

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_string(),
        source,
    })?;
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })
}
