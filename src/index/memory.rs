//! In-memory tenant store implementation.
//!
//! Useful for testing and small ephemeral datasets. Provides the same append,
//! search, and clear semantics as the SQLite store, without persistence.

use super::{rank_by_distance, validate_append, validate_tenant_id, SearchHit, TenantStore};
use crate::error::{KildeError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// One tenant's vectors and chunk texts, positionally aligned.
#[derive(Debug, Default)]
struct TenantSlot {
    dimension: Option<usize>,
    vectors: Vec<Vec<f32>>,
    texts: Vec<String>,
}

/// In-memory tenant store.
pub struct MemoryTenantStore {
    tenants: RwLock<HashMap<String, TenantSlot>>,
}

impl MemoryTenantStore {
    /// Create a new in-memory tenant store.
    pub fn new() -> Self {
        Self {
            tenants: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryTenantStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TenantStore for MemoryTenantStore {
    async fn append(&self, tenant: &str, vectors: &[Vec<f32>], texts: &[String]) -> Result<usize> {
        validate_tenant_id(tenant)?;

        let mut tenants = self.tenants.write().map_err(|e| {
            KildeError::Index(format!("Failed to acquire store lock: {}", e))
        })?;

        // Validate against the established dimension before touching the slot,
        // so a rejected append leaves the stored pair unchanged
        let established = tenants.get(tenant).and_then(|slot| slot.dimension);
        let dimension = validate_append(vectors, texts, established)?;

        let slot = tenants.entry(tenant.to_string()).or_default();
        slot.dimension = Some(dimension);
        slot.vectors.extend(vectors.iter().cloned());
        slot.texts.extend(texts.iter().cloned());

        Ok(vectors.len())
    }

    async fn search(&self, tenant: &str, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        validate_tenant_id(tenant)?;

        let tenants = self.tenants.read().map_err(|e| {
            KildeError::Index(format!("Failed to acquire store lock: {}", e))
        })?;

        let Some(slot) = tenants.get(tenant) else {
            return Ok(Vec::new());
        };

        if slot.vectors.len() != slot.texts.len() {
            return Err(KildeError::IndexCorruption {
                tenant: tenant.to_string(),
                detail: format!("{} vectors but {} chunks", slot.vectors.len(), slot.texts.len()),
            });
        }
        if slot.vectors.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        if let Some(dimension) = slot.dimension {
            if query.len() != dimension {
                return Err(KildeError::DimensionMismatch {
                    expected: dimension,
                    actual: query.len(),
                });
            }
        }

        let entries = slot
            .vectors
            .iter()
            .cloned()
            .zip(slot.texts.iter().cloned());

        Ok(rank_by_distance(query, entries, k))
    }

    async fn clear(&self, tenant: &str) -> Result<()> {
        validate_tenant_id(tenant)?;

        let mut tenants = self.tenants.write().map_err(|e| {
            KildeError::Index(format!("Failed to acquire store lock: {}", e))
        })?;
        tenants.remove(tenant);
        Ok(())
    }

    async fn chunk_count(&self, tenant: &str) -> Result<usize> {
        validate_tenant_id(tenant)?;

        let tenants = self.tenants.read().map_err(|e| {
            KildeError::Index(format!("Failed to acquire store lock: {}", e))
        })?;
        Ok(tenants.get(tenant).map_or(0, |slot| slot.texts.len()))
    }

    async fn exists(&self, tenant: &str) -> Result<bool> {
        validate_tenant_id(tenant)?;

        let tenants = self.tenants.read().map_err(|e| {
            KildeError::Index(format!("Failed to acquire store lock: {}", e))
        })?;
        Ok(tenants.contains_key(tenant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_append_then_search() {
        let store = MemoryTenantStore::new();

        store
            .append(
                "alice",
                &[vec![1.0, 0.0], vec![0.0, 1.0]],
                &texts(&["east", "north"]),
            )
            .await
            .unwrap();

        let hits = store.search("alice", &[0.9, 0.1], 2).await.unwrap();
        assert_eq!(hits[0].content, "east");
        assert_eq!(hits[1].content, "north");
    }

    #[tokio::test]
    async fn test_counts_stay_aligned_across_appends() {
        let store = MemoryTenantStore::new();

        store.append("t", &[vec![1.0]], &texts(&["a"])).await.unwrap();
        store
            .append("t", &[vec![2.0], vec![3.0]], &texts(&["b", "c"]))
            .await
            .unwrap();

        assert_eq!(store.chunk_count("t").await.unwrap(), 3);

        // All appended chunks are reachable through search
        let hits = store.search("t", &[0.0], 10).await.unwrap();
        let contents: Vec<&str> = hits.iter().map(|h| h.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_rejected_append_leaves_state_unchanged() {
        let store = MemoryTenantStore::new();
        store.append("t", &[vec![1.0, 0.0]], &texts(&["a"])).await.unwrap();

        assert!(store
            .append("t", &[vec![1.0, 0.0]], &texts(&["b", "c"]))
            .await
            .is_err());
        assert!(store
            .append("t", &[vec![1.0, 0.0, 0.0]], &texts(&["b"]))
            .await
            .is_err());

        assert_eq!(store.chunk_count("t").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent_and_resets_dimension() {
        let store = MemoryTenantStore::new();
        store.append("t", &[vec![1.0, 0.0]], &texts(&["a"])).await.unwrap();

        store.clear("t").await.unwrap();
        store.clear("t").await.unwrap();
        assert!(store.search("t", &[1.0, 0.0], 5).await.unwrap().is_empty());

        store
            .append("t", &[vec![1.0, 0.0, 0.0]], &texts(&["fresh"]))
            .await
            .unwrap();
        let hits = store.search("t", &[1.0, 0.0, 0.0], 5).await.unwrap();
        assert_eq!(hits[0].content, "fresh");
    }

    #[tokio::test]
    async fn test_unknown_tenant_searches_empty() {
        let store = MemoryTenantStore::new();
        assert!(store.search("ghost", &[1.0], 3).await.unwrap().is_empty());
        assert!(!store.exists("ghost").await.unwrap());
    }
}
