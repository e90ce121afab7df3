//! Per-tenant vector index and chunk store.
//!
//! Each tenant owns an isolated pair of positionally aligned collections: a
//! vector index and a chunk-text store. The alignment invariant (vector count ==
//! chunk count, same ordering) is what the whole retrieval path depends on, so
//! writes update both sides transactionally and reads verify the counts.

mod memory;
mod sqlite;

pub use memory::MemoryTenantStore;
pub use sqlite::SqliteTenantStore;

use crate::error::{KildeError, Result};
use async_trait::async_trait;

/// A retrieval hit: one stored chunk and its distance from the query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// L2 distance from the query vector (smaller is closer).
    pub distance: f32,
    /// The stored chunk text.
    pub content: String,
}

/// Trait for tenant-scoped index store implementations.
///
/// Every operation is scoped by tenant id; no implementation may let one
/// tenant's data reach another. Writers on the same tenant are mutually
/// exclusive; distinct tenants never contend.
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Append vectors and their chunk texts to a tenant's knowledge base.
    ///
    /// `vectors` and `texts` must have equal length, and each vector must match
    /// the dimension established by the tenant's first append. Both sides are
    /// appended atomically; a failed append leaves the stored state unchanged.
    /// Returns the number of chunks appended.
    async fn append(&self, tenant: &str, vectors: &[Vec<f32>], texts: &[String]) -> Result<usize>;

    /// Return up to `k` stored chunks nearest to the query vector, ascending by
    /// L2 distance. A tenant with no knowledge base yields an empty result, not
    /// an error, and no state is created as a side effect.
    async fn search(&self, tenant: &str, query: &[f32], k: usize) -> Result<Vec<SearchHit>>;

    /// Discard a tenant's entire knowledge base. Safe to call when none exists.
    async fn clear(&self, tenant: &str) -> Result<()>;

    /// Number of chunks stored for a tenant (0 when no knowledge base exists).
    async fn chunk_count(&self, tenant: &str) -> Result<usize>;

    /// Whether the tenant has a knowledge base at all.
    async fn exists(&self, tenant: &str) -> Result<bool>;
}

/// Validate a tenant identifier before deriving any storage location from it.
///
/// Restricting the alphabet keeps tenant ids safe to use as directory names and
/// makes cross-tenant path escapes impossible.
pub fn validate_tenant_id(tenant: &str) -> Result<()> {
    if tenant.is_empty() {
        return Err(KildeError::InvalidInput("tenant id must not be empty".to_string()));
    }
    if !tenant
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        || tenant.starts_with('.')
    {
        return Err(KildeError::InvalidInput(format!(
            "invalid tenant id '{}': only letters, digits, '.', '_' and '-' are allowed",
            tenant
        )));
    }
    Ok(())
}

/// Compute the Euclidean (L2) distance between two vectors.
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Rank stored entries by ascending L2 distance to the query, keeping the top k.
pub(crate) fn rank_by_distance(
    query: &[f32],
    entries: impl IntoIterator<Item = (Vec<f32>, String)>,
    k: usize,
) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = entries
        .into_iter()
        .map(|(vector, content)| SearchHit {
            distance: l2_distance(query, &vector),
            content,
        })
        .collect();

    hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
    hits.truncate(k);
    hits
}

/// Validate an append request against the store's established dimension.
///
/// Shared by implementations so the length and dimension rules stay identical.
pub(crate) fn validate_append(
    vectors: &[Vec<f32>],
    texts: &[String],
    established_dimension: Option<usize>,
) -> Result<usize> {
    if vectors.len() != texts.len() {
        return Err(KildeError::InvalidInput(format!(
            "append requires matching counts: {} vectors, {} texts",
            vectors.len(),
            texts.len()
        )));
    }
    if vectors.is_empty() {
        return Err(KildeError::InvalidInput(
            "append requires at least one vector".to_string(),
        ));
    }

    let incoming = vectors[0].len();
    if incoming == 0 {
        return Err(KildeError::InvalidInput("vectors must not be empty".to_string()));
    }
    for v in vectors {
        if v.len() != incoming {
            return Err(KildeError::DimensionMismatch {
                expected: incoming,
                actual: v.len(),
            });
        }
    }

    // First append on an empty index fixes the dimension for its lifetime
    let dimension = established_dimension.unwrap_or(incoming);
    if incoming != dimension {
        return Err(KildeError::DimensionMismatch {
            expected: dimension,
            actual: incoming,
        });
    }

    Ok(dimension)
}
