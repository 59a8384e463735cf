//! Pinecone evidence store.
//!
//! Talks to a serverless index's data plane over REST:
//!
//! | Operation | Endpoint |
//! |-----------|----------|
//! | add | `POST {host}/vectors/upsert` |
//! | search | `POST {host}/query` |
//! | count | `POST {host}/describe_index_stats` |
//!
//! Document text is stored in the vector metadata under `content`.

use super::EvidenceStore;
use crate::embedding::Embedder;
use crate::models::{EvidenceHit, NewDocument, source_of};
use crate::{Error, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

const API_VERSION: &str = "2024-07";
const CONTENT_KEY: &str = "content";
/// Vectors per upsert request.
const UPSERT_BATCH: usize = 100;

/// Evidence store backed by a Pinecone index.
pub struct PineconeEvidenceStore {
    host: String,
    api_key: SecretString,
    namespace: Option<String>,
    embedder: Arc<dyn Embedder>,
    client: reqwest::Client,
}

impl std::fmt::Debug for PineconeEvidenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PineconeEvidenceStore")
            .field("host", &self.host)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<Vector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Serialize)]
struct Vector {
    id: String,
    values: Vec<f32>,
    metadata: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: Vec<f32>,
    top_k: usize,
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Deserialize)]
struct Match {
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    total_vector_count: usize,
    #[serde(default)]
    namespaces: Map<String, Value>,
}

impl PineconeEvidenceStore {
    /// Creates a store for the index at `host`.
    ///
    /// A host without a scheme gets `https://`.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        api_key: SecretString,
        embedder: Arc<dyn Embedder>,
        client: reqwest::Client,
    ) -> Self {
        let host = host.into();
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("https://{host}")
        };
        Self {
            host: host.trim_end_matches('/').to_string(),
            api_key,
            namespace: None,
            embedder,
            client,
        }
    }

    /// Sets the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    async fn post<Req: Serialize + Sync, Resp: DeserializeOwned>(
        &self,
        path: &str,
        operation: &str,
        body: &Req,
    ) -> Result<Resp> {
        let response = self
            .client
            .post(format!("{}{path}", self.host))
            .header("Api-Key", self.api_key.expose_secret())
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::failed(operation, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::failed(
                operation,
                format!("index returned status: {status} - {body}"),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| Error::failed(operation, e))
    }
}

#[async_trait]
impl EvidenceStore for PineconeEvidenceStore {
    fn name(&self) -> &'static str {
        "pinecone"
    }

    async fn add_documents(&self, docs: Vec<NewDocument>) -> Result<usize> {
        let mut vectors = Vec::with_capacity(docs.len());
        for doc in docs {
            let values = self.embedder.embed(&doc.content)?;
            let mut metadata = doc.metadata;
            metadata.insert(CONTENT_KEY.to_string(), Value::String(doc.content));
            vectors.push(Vector {
                id: format!("doc-{}", uuid::Uuid::now_v7()),
                values,
                metadata,
            });
        }

        let mut added = 0;
        while !vectors.is_empty() {
            let rest = vectors.split_off(vectors.len().min(UPSERT_BATCH));
            let batch = std::mem::replace(&mut vectors, rest);
            let response: UpsertResponse = self
                .post(
                    "/vectors/upsert",
                    "pinecone_upsert",
                    &UpsertRequest {
                        vectors: batch,
                        namespace: self.namespace.as_deref(),
                    },
                )
                .await?;
            added += response.upserted_count;
        }

        metrics::counter!("evidence_documents_added_total", "backend" => "pinecone")
            .increment(added as u64);
        Ok(added)
    }

    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<EvidenceHit>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed(query)?;
        let response: QueryResponse = self
            .post(
                "/query",
                "pinecone_query",
                &QueryRequest {
                    vector,
                    top_k: k,
                    include_metadata: true,
                    namespace: self.namespace.as_deref(),
                },
            )
            .await?;

        let mut hits: Vec<EvidenceHit> = response
            .matches
            .into_iter()
            .map(|m| {
                let content = m
                    .metadata
                    .get(CONTENT_KEY)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                EvidenceHit::new(source_of(&m.metadata), content, m.score)
            })
            .collect();
        hits.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        Ok(hits)
    }

    async fn count(&self) -> Result<usize> {
        let stats: StatsResponse = self
            .post(
                "/describe_index_stats",
                "pinecone_stats",
                &serde_json::json!({}),
            )
            .await?;

        let Some(namespace) = self.namespace.as_deref() else {
            return Ok(stats.total_vector_count);
        };
        let count = stats
            .namespaces
            .get(namespace)
            .and_then(|ns| ns.get("vectorCount"))
            .and_then(Value::as_u64)
            .unwrap_or(0);
        Ok(usize::try_from(count).unwrap_or(usize::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::CharCodeEmbedder;

    fn store(host: &str) -> PineconeEvidenceStore {
        PineconeEvidenceStore::new(
            host,
            SecretString::from("pc-key"),
            Arc::new(CharCodeEmbedder::new()),
            reqwest::Client::new(),
        )
    }

    #[test]
    fn test_host_normalization() {
        assert_eq!(store("idx.svc.pinecone.io/").host, "https://idx.svc.pinecone.io");
        assert_eq!(store("http://localhost:5080").host, "http://localhost:5080");
    }

    #[test]
    fn test_query_wire_format() {
        let body = serde_json::to_value(QueryRequest {
            vector: vec![0.5],
            top_k: 3,
            include_metadata: true,
            namespace: None,
        })
        .expect("serializes");
        assert_eq!(body["topK"], 3);
        assert_eq!(body["includeMetadata"], true);
        assert!(body.get("namespace").is_none());
    }

    #[test]
    fn test_match_decoding() {
        let response: QueryResponse = serde_json::from_str(
            r#"{"matches":[{"id":"doc-1","score":0.8,"metadata":{"content":"Heat kills","source":"WHO"}}]}"#,
        )
        .expect("decodes");
        assert_eq!(response.matches.len(), 1);
        assert_eq!(source_of(&response.matches[0].metadata), "WHO");
    }

    #[tokio::test]
    async fn test_k_zero_skips_network() {
        // Unroutable host; k == 0 must not send a request.
        let hits = store("http://127.0.0.1:1")
            .similarity_search("heat", 0)
            .await
            .expect("search");
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_index_errors() {
        let result = store("http://127.0.0.1:1").similarity_search("heat", 3).await;
        assert!(matches!(result, Err(Error::OperationFailed { .. })));
    }
}
