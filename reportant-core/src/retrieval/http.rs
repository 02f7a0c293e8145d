//! HTTP-backed retrieval provider.
//!
//! Queries a remote vector-search service over a small JSON POST API:
//! `{ "query": "...", "top_k": N }` → `{ "chunks": [ { "document_id",
//! "text", "score" } ] }`. The index itself (ingestion, embedding, ranking)
//! lives in that service.

use super::{RetrievalProvider, RetrievedChunk};
use crate::error::RetrievalError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    chunks: Vec<RetrievedChunk>,
}

/// Client for a remote snippet-search endpoint.
pub struct HttpRetriever {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpRetriever {
    pub fn new(endpoint: &str, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            endpoint: endpoint.to_string(),
            client,
        }
    }
}

#[async_trait]
impl RetrievalProvider for HttpRetriever {
    async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, RetrievalError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "query": query, "top_k": top_k }))
            .send()
            .await
            .map_err(|e| RetrievalError::Connection {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::QueryFailed {
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let parsed: SearchResponse =
            response
                .json()
                .await
                .map_err(|e| RetrievalError::QueryFailed {
                    message: format!("Failed to decode search response: {}", e),
                })?;
        Ok(parsed.chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_decoding() {
        let body = r#"{"chunks":[{"document_id":"ghg-2021.pdf","text":"2021년 총배출량은 676,648 Gg CO2eq이다.","score":0.91}]}"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.chunks.len(), 1);
        assert_eq!(parsed.chunks[0].document_id, "ghg-2021.pdf");
        assert!(parsed.chunks[0].score > 0.9);
    }
}
