//! Pinecone data-plane client
//!
//! Talks to an index host (`https://<index>-<project>.svc.<env>.pinecone.io`)
//! over its REST API: `POST /vectors/upsert` and `POST /query`.

use super::{IndexMatch, VectorIndex};
use crate::error::OrchestrationError;
use crate::models::Metadata;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

#[derive(Clone)]
pub struct PineconeIndex {
    client: Client,
    host: String,
    api_key: String,
    namespace: Option<String>,
}

impl PineconeIndex {
    pub fn new(api_key: String, host: String, namespace: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(30))
            .build()?;

        let host = host.trim_end_matches('/');
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };

        Ok(Self {
            client,
            host,
            api_key,
            namespace,
        })
    }

    async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> Result<Value> {
        let url = format!("{}{}", self.host, path);

        let response = self
            .client
            .post(url)
            .header("Api-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                OrchestrationError::IndexUnavailable(format!(
                    "Pinecone request failed for {}: {}",
                    path, e
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OrchestrationError::IndexUnavailable(format!(
                "Pinecone returned {} for {}: {}",
                status, path, body
            )));
        }

        response.json::<Value>().await.map_err(|e| {
            OrchestrationError::IndexUnavailable(format!("Invalid Pinecone response: {}", e))
        })
    }
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<UpsertVector<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: Vec<f32>,
    metadata: Metadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Metadata>,
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, id: &str, vector: Vec<f32>, metadata: Metadata) -> Result<()> {
        let request = UpsertRequest {
            vectors: vec![UpsertVector {
                id,
                values: vector,
                metadata,
            }],
            namespace: self.namespace.as_deref(),
        };

        self.post_json("/vectors/upsert", &request).await?;
        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<IndexMatch>> {
        let request = QueryRequest {
            vector,
            top_k: k,
            include_metadata: true,
            namespace: self.namespace.as_deref(),
        };

        let body = self.post_json("/query", &request).await?;
        let parsed: QueryResponse = serde_json::from_value(body).map_err(|e| {
            OrchestrationError::IndexUnavailable(format!("Unexpected Pinecone query shape: {}", e))
        })?;

        Ok(parsed
            .matches
            .into_iter()
            .map(|m| IndexMatch {
                id: m.id,
                score: m.score,
                metadata: m.metadata.unwrap_or_default(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_uses_camel_case() {
        let vector = [0.5f32, 0.5];
        let request = QueryRequest {
            vector: &vector,
            top_k: 3,
            include_metadata: true,
            namespace: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["topK"], 3);
        assert_eq!(json["includeMetadata"], true);
        assert!(json.get("namespace").is_none());
    }

    #[test]
    fn test_query_response_parsing() {
        let body = serde_json::json!({
            "matches": [
                {"id": "doc_1", "score": 0.91, "metadata": {"text": "Refunds take 5 days."}},
                {"id": "doc_2", "score": 0.42}
            ],
            "namespace": ""
        });

        let parsed: QueryResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.matches.len(), 2);
        assert_eq!(parsed.matches[0].id, "doc_1");
        assert!(parsed.matches[1].metadata.is_none());
    }

    #[test]
    fn test_host_gets_scheme() {
        let index = PineconeIndex::new(
            "key".to_string(),
            "ops-abc123.svc.us-east1-gcp.pinecone.io/".to_string(),
            None,
        )
        .unwrap();
        assert_eq!(index.host, "https://ops-abc123.svc.us-east1-gcp.pinecone.io");
    }
}
