use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::{value::Kind, SearchPointsBuilder, Value};
use qdrant_client::Qdrant;

use crate::domain::{ports::VectorStore, DocumentFragment, DomainError, Embedding, SearchResult};
use crate::infrastructure::config::QdrantConfig;

pub struct QdrantVectorStore {
    client: Qdrant,
    collection: String,
    content_field: String,
}

impl QdrantVectorStore {
    pub fn new(url: &str, collection: &str) -> Result<Self, DomainError> {
        Self::from_config(&QdrantConfig {
            url: url.to_string(),
            collection: collection.to_string(),
            ..QdrantConfig::default()
        })
    }

    pub fn from_config(config: &QdrantConfig) -> Result<Self, DomainError> {
        let client = Qdrant::from_url(&config.url)
            .api_key(config.api_key.clone())
            .build()
            .map_err(|e| DomainError::external(e.to_string()))?;

        Ok(Self {
            client,
            collection: config.collection.clone(),
            content_field: config.content_field.clone(),
        })
    }

    fn to_fragment(&self, mut payload: HashMap<String, Value>) -> Option<DocumentFragment> {
        let content = payload.remove(&self.content_field)?.as_str()?.to_string();
        let metadata: serde_json::Map<String, serde_json::Value> = payload
            .into_iter()
            .map(|(key, value)| (key, payload_to_json(value)))
            .collect();

        Some(DocumentFragment::new(content).with_metadata(serde_json::Value::Object(metadata)))
    }
}

fn payload_to_json(value: Value) -> serde_json::Value {
    match value.kind {
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::IntegerValue(i)) => i.into(),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(d)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Some(Kind::BoolValue(b)) => b.into(),
        Some(Kind::ListValue(list)) => {
            serde_json::Value::Array(list.values.into_iter().map(payload_to_json).collect())
        }
        Some(Kind::StructValue(s)) => serde_json::Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, payload_to_json(v)))
                .collect(),
        ),
        Some(Kind::NullValue(_)) | None => serde_json::Value::Null,
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn search(&self, query: &Embedding, top_k: usize) -> Result<Vec<SearchResult>, DomainError> {
        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, query.as_slice().to_vec(), top_k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        let search_results: Vec<SearchResult> = results
            .result
            .into_iter()
            .filter_map(|point| {
                let score = point.score;
                match self.to_fragment(point.payload) {
                    Some(fragment) => Some(SearchResult { fragment, score }),
                    None => {
                        tracing::warn!(
                            collection = %self.collection,
                            field = %self.content_field,
                            "point without text content skipped"
                        );
                        None
                    }
                }
            })
            .collect();

        Ok(search_results)
    }
}
