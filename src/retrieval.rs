//! Nearest-neighbor retrieval over a tenant's knowledge base.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::index::{SearchHit, TenantStore};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Number of chunks retrieved per question by default.
pub const DEFAULT_TOP_K: usize = 3;

/// The outcome of one retrieval: the query's embedding and the ranked hits.
///
/// The embedding is surfaced so downstream scoring can reuse it instead of
/// re-embedding the question.
#[derive(Debug, Clone)]
pub struct Retrieval {
    /// Embedding of the query text (empty when no knowledge base exists).
    pub query_embedding: Vec<f32>,
    /// Retrieved chunks, ascending by distance.
    pub hits: Vec<SearchHit>,
}

impl Retrieval {
    /// Whether anything was retrieved.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Embeds queries and searches the tenant store.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn TenantStore>,
}

impl Retriever {
    /// Create a new retriever.
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn TenantStore>) -> Self {
        Self { embedder, store }
    }

    /// Retrieve the `k` chunks nearest to the query for a tenant.
    ///
    /// A tenant without a knowledge base yields an empty retrieval, not an
    /// error; the embedder is not called in that case.
    #[instrument(skip(self), fields(tenant = %tenant, query = %query))]
    pub async fn retrieve(&self, tenant: &str, query: &str, k: usize) -> Result<Retrieval> {
        if !self.store.exists(tenant).await? {
            debug!("No knowledge base for tenant '{}'", tenant);
            return Ok(Retrieval {
                query_embedding: Vec::new(),
                hits: Vec::new(),
            });
        }

        let query_embedding = self.embedder.embed(query).await?;
        let hits = self.store.search(tenant, &query_embedding, k).await?;

        debug!("Retrieved {} chunks for tenant '{}'", hits.len(), tenant);
        Ok(Retrieval {
            query_embedding,
            hits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MemoryTenantStore;
    use async_trait::async_trait;

    /// Deterministic test embedder: maps known phrases to fixed vectors.
    struct StubEmbedder;

    fn stub_vector(text: &str) -> Vec<f32> {
        match text {
            "What is the capital of France?" => vec![0.9, 0.1, 0.0],
            "Paris is the capital of France" => vec![1.0, 0.0, 0.0],
            "The mitochondria is the powerhouse of the cell" => vec![0.0, 1.0, 0.0],
            "Rust has a borrow checker" => vec![0.0, 0.0, 1.0],
            _ => vec![0.0, 0.0, 0.0],
        }
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(stub_vector(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| stub_vector(t)).collect())
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    #[tokio::test]
    async fn test_relevant_chunk_ranks_first() {
        let store = Arc::new(MemoryTenantStore::new());
        let embedder = Arc::new(StubEmbedder);

        let chunks = vec![
            "Paris is the capital of France".to_string(),
            "The mitochondria is the powerhouse of the cell".to_string(),
            "Rust has a borrow checker".to_string(),
        ];
        let vectors = embedder.embed_batch(&chunks).await.unwrap();
        store.append("alice", &vectors, &chunks).await.unwrap();

        let retriever = Retriever::new(embedder, store);
        let retrieval = retriever
            .retrieve("alice", "What is the capital of France?", 3)
            .await
            .unwrap();

        assert_eq!(retrieval.hits.len(), 3);
        assert_eq!(retrieval.hits[0].content, "Paris is the capital of France");
        assert!(retrieval.hits[0].distance < retrieval.hits[1].distance);
        assert_eq!(retrieval.query_embedding, vec![0.9, 0.1, 0.0]);
    }

    #[tokio::test]
    async fn test_no_knowledge_base_yields_empty() {
        let retriever = Retriever::new(Arc::new(StubEmbedder), Arc::new(MemoryTenantStore::new()));

        let retrieval = retriever.retrieve("ghost", "anything", 3).await.unwrap();
        assert!(retrieval.is_empty());
        assert!(retrieval.query_embedding.is_empty());
    }
}
