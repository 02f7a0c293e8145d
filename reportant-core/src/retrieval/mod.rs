//! Retrieval provider abstraction.
//!
//! Grounding context for section generation comes from two sources: ranked
//! text snippets from a document index (`RetrievalProvider`) and numeric
//! summaries of tabular data (`TabularProvider`, see `tabular`). Both are
//! external collaborators; failures degrade grounding instead of failing a
//! report run.

pub mod context;
pub mod http;
pub mod tabular;

use crate::error::RetrievalError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use context::{AssembledContext, ContextAssembler};
pub use http::HttpRetriever;
pub use tabular::{InMemoryTable, TableRow, TabularProvider, TabularQuery, TabularSummary};

/// A retrieved snippet with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub document_id: String,
    pub text: String,
    pub score: f32,
}

/// Trait for retrieval providers: given a query, return ranked supporting
/// snippets.
#[async_trait]
pub trait RetrievalProvider: Send + Sync {
    async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, RetrievalError>;
}

/// A fixed in-memory retriever. Serves small local corpora and tests.
#[derive(Debug, Default)]
pub struct StaticRetriever {
    chunks: Vec<RetrievedChunk>,
}

impl StaticRetriever {
    pub fn new(chunks: Vec<RetrievedChunk>) -> Self {
        Self { chunks }
    }

    /// Build from plain snippet texts with descending synthetic scores.
    pub fn from_texts(texts: &[&str]) -> Self {
        let chunks = texts
            .iter()
            .enumerate()
            .map(|(i, text)| RetrievedChunk {
                document_id: format!("doc-{}", i),
                text: text.to_string(),
                score: 1.0 - (i as f32) * 0.05,
            })
            .collect();
        Self { chunks }
    }
}

#[async_trait]
impl RetrievalProvider for StaticRetriever {
    async fn retrieve(
        &self,
        _query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, RetrievalError> {
        Ok(self.chunks.iter().take(top_k).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_retriever_respects_top_k() {
        let retriever = StaticRetriever::from_texts(&["a", "b", "c", "d"]);
        let chunks = retriever.retrieve("any query", 2).await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "a");
        assert!(chunks[0].score > chunks[1].score);
    }
}
