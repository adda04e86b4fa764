use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{ports::VectorStore, DocumentFragment, DomainError, Embedding, SearchResult};
use crate::infrastructure::config::SupabaseConfig;

/// Similarity search through a Postgres function exposed by Supabase's REST
/// API (`/rest/v1/rpc/<query_name>`), pgvector-backed.
pub struct SupabaseVectorStore {
    http: reqwest::Client,
    url: String,
    api_key: String,
    query_name: String,
}

#[derive(Serialize)]
struct MatchRequest<'a> {
    query_embedding: &'a [f32],
    match_count: usize,
    filter: serde_json::Value,
}

#[derive(Deserialize)]
struct MatchRow {
    content: String,
    #[serde(default)]
    metadata: serde_json::Value,
    similarity: f32,
}

impl SupabaseVectorStore {
    pub fn new(http: reqwest::Client, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            api_key: api_key.into(),
            query_name: "match_documents".to_string(),
        }
    }

    pub fn from_config(http: reqwest::Client, config: &SupabaseConfig) -> Result<Self, DomainError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| DomainError::validation("Supabase key is not configured"))?;

        Ok(Self::new(http, config.url.clone(), api_key).with_query_name(config.query_name.clone()))
    }

    pub fn with_query_name(mut self, query_name: impl Into<String>) -> Self {
        self.query_name = query_name.into();
        self
    }

    fn rpc_url(&self) -> String {
        format!(
            "{}/rest/v1/rpc/{}",
            self.url.trim_end_matches('/'),
            self.query_name
        )
    }
}

#[async_trait]
impl VectorStore for SupabaseVectorStore {
    async fn search(&self, query: &Embedding, top_k: usize) -> Result<Vec<SearchResult>, DomainError> {
        let body = MatchRequest {
            query_embedding: query.as_slice(),
            match_count: top_k,
            filter: serde_json::json!({}),
        };

        let response = self
            .http
            .post(self.rpc_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::external(format!("vector store request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DomainError::external(format!(
                "vector store returned HTTP {status}: {detail}"
            )));
        }

        let rows: Vec<MatchRow> = response
            .json()
            .await
            .map_err(|e| DomainError::external(format!("malformed vector store response: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|row| SearchResult {
                fragment: DocumentFragment::new(row.content).with_metadata(row.metadata),
                score: row.similarity,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(String, Option<String>, serde_json::Value)>>>;

    async fn rpc(
        State(seen): State<Seen>,
        Path(function): Path<String>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> Result<Json<serde_json::Value>, StatusCode> {
        let apikey = headers
            .get("apikey")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        seen.lock().unwrap().push((function.clone(), apikey, body));

        if function != "match_documents" {
            return Err(StatusCode::NOT_FOUND);
        }

        Ok(Json(serde_json::json!([
            {"id": 1, "content": "Refunds within 30 days.", "metadata": {"source": "faq"}, "similarity": 0.91},
            {"id": 2, "content": "Store credit after 30 days.", "metadata": {}, "similarity": 0.87}
        ])))
    }

    async fn spawn_supabase() -> (String, Seen) {
        let seen: Seen = Arc::default();
        let app = Router::new()
            .route("/rest/v1/rpc/{function}", post(rpc))
            .with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}"), seen)
    }

    #[tokio::test]
    async fn test_search_calls_match_documents() {
        let (url, seen) = spawn_supabase().await;
        let store = SupabaseVectorStore::new(reqwest::Client::new(), url, "service-key");

        let results = store
            .search(&Embedding::new(vec![0.5, 0.25]), 2)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].fragment.content, "Refunds within 30 days.");
        assert_eq!(results[0].fragment.metadata["source"], "faq");
        assert!((results[1].score - 0.87).abs() < 1e-6);

        let seen = seen.lock().unwrap();
        let (function, apikey, body) = &seen[0];
        assert_eq!(function, "match_documents");
        assert_eq!(apikey.as_deref(), Some("service-key"));
        assert_eq!(body["match_count"], 2);
        assert_eq!(body["query_embedding"], serde_json::json!([0.5, 0.25]));
        assert_eq!(body["filter"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_http_error_is_external() {
        let (url, _) = spawn_supabase().await;
        let store = SupabaseVectorStore::new(reqwest::Client::new(), url, "key")
            .with_query_name("missing_function");

        let err = store.search(&Embedding::new(vec![1.0]), 4).await.unwrap_err();
        assert!(matches!(err, DomainError::ExternalService(_)));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = SupabaseConfig {
            url: "https://example.supabase.co".into(),
            ..SupabaseConfig::default()
        };
        assert!(SupabaseVectorStore::from_config(reqwest::Client::new(), &config).is_err());
    }
}
