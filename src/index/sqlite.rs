//! SQLite-backed tenant store implementation.
//!
//! Each tenant gets its own directory under the store root, holding a single
//! SQLite database with two positionally aligned tables: `vectors` and
//! `chunks`. Appending inside one transaction keeps the pair consistent even if
//! the process dies mid-write; a count mismatch found on read is reported as
//! corruption rather than silently truncated.

use super::{rank_by_distance, validate_append, validate_tenant_id, SearchHit, TenantStore};
use crate::error::{KildeError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument};

const DB_FILE: &str = "knowledge.db";

/// SQLite-backed tenant store.
///
/// Connections are opened lazily per tenant and guarded by per-tenant mutexes,
/// so writers on one tenant serialize while other tenants proceed untouched.
pub struct SqliteTenantStore {
    root: PathBuf,
    connections: Mutex<HashMap<String, Arc<Mutex<Connection>>>>,
}

impl SqliteTenantStore {
    /// Create a store rooted at the given directory.
    #[instrument(skip_all)]
    pub fn new(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        info!("Initialized tenant store at {:?}", root);

        Ok(Self {
            root: root.to_path_buf(),
            connections: Mutex::new(HashMap::new()),
        })
    }

    fn tenant_dir(&self, tenant: &str) -> PathBuf {
        self.root.join(tenant)
    }

    fn db_path(&self, tenant: &str) -> PathBuf {
        self.tenant_dir(tenant).join(DB_FILE)
    }

    /// Get the tenant's connection, opening (and optionally creating) it.
    ///
    /// Returns `None` when the tenant has no database and `create` is false, so
    /// read paths never create tenant state as a side effect.
    fn connection(&self, tenant: &str, create: bool) -> Result<Option<Arc<Mutex<Connection>>>> {
        let mut map = self.connections.lock().map_err(|e| {
            KildeError::Index(format!("Failed to acquire store lock: {}", e))
        })?;

        if let Some(conn) = map.get(tenant) {
            return Ok(Some(conn.clone()));
        }

        let db_path = self.db_path(tenant);
        if !db_path.exists() && !create {
            return Ok(None);
        }

        if create {
            std::fs::create_dir_all(self.tenant_dir(tenant))?;
        }

        let conn = Connection::open(&db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS vectors (
                position INTEGER PRIMARY KEY,
                embedding BLOB NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chunks (
                position INTEGER PRIMARY KEY,
                content TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO index_meta (key, value) VALUES ('created_at', ?1)",
            params![Utc::now().to_rfc3339()],
        )?;

        debug!("Opened knowledge base for tenant '{}'", tenant);

        let conn = Arc::new(Mutex::new(conn));
        map.insert(tenant.to_string(), conn.clone());
        Ok(Some(conn))
    }

    fn lock_conn(conn: &Arc<Mutex<Connection>>) -> Result<std::sync::MutexGuard<'_, Connection>> {
        conn.lock()
            .map_err(|e| KildeError::Index(format!("Failed to acquire tenant lock: {}", e)))
    }

    /// The vector dimension established for a tenant, if any.
    pub fn dimension(&self, tenant: &str) -> Result<Option<usize>> {
        validate_tenant_id(tenant)?;

        let Some(conn) = self.connection(tenant, false)? else {
            return Ok(None);
        };
        let conn = Self::lock_conn(&conn)?;
        Self::read_dimension(&conn)
    }

    /// When the tenant's knowledge base was first created, if it exists.
    pub fn created_at(&self, tenant: &str) -> Result<Option<String>> {
        validate_tenant_id(tenant)?;

        let Some(conn) = self.connection(tenant, false)? else {
            return Ok(None);
        };
        let conn = Self::lock_conn(&conn)?;

        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM index_meta WHERE key = 'created_at'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// List tenants that currently have a knowledge base on disk.
    pub fn list_tenants(&self) -> Result<Vec<String>> {
        let mut tenants = Vec::new();

        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.path().join(DB_FILE).exists() {
                tenants.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        tenants.sort();
        Ok(tenants)
    }

    fn read_dimension(conn: &Connection) -> Result<Option<usize>> {
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM index_meta WHERE key = 'dimension'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            Some(v) => {
                let dim = v.parse::<usize>().map_err(|_| KildeError::Index(format!(
                    "Unreadable dimension record: {}",
                    v
                )))?;
                Ok(Some(dim))
            }
            None => Ok(None),
        }
    }

    fn table_count(conn: &Connection, table: &str) -> Result<usize> {
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }
}

#[async_trait]
impl TenantStore for SqliteTenantStore {
    #[instrument(skip(self, vectors, texts), fields(tenant = %tenant, count = vectors.len()))]
    async fn append(&self, tenant: &str, vectors: &[Vec<f32>], texts: &[String]) -> Result<usize> {
        validate_tenant_id(tenant)?;

        let conn = self.connection(tenant, true)?.ok_or_else(|| {
            KildeError::Index(format!("Could not open knowledge base for tenant '{}'", tenant))
        })?;
        let conn = Self::lock_conn(&conn)?;

        let established = Self::read_dimension(&conn)?;
        let dimension = validate_append(vectors, texts, established)?;

        // Both tables and the dimension record move in one transaction, so a
        // failure at any point leaves the stored pair untouched.
        let tx = conn.unchecked_transaction()?;

        let base = Self::table_count(&tx, "chunks")?;
        for (offset, (vector, text)) in vectors.iter().zip(texts.iter()).enumerate() {
            let position = (base + offset) as i64;
            tx.execute(
                "INSERT INTO vectors (position, embedding) VALUES (?1, ?2)",
                params![position, Self::embedding_to_bytes(vector)],
            )?;
            tx.execute(
                "INSERT INTO chunks (position, content) VALUES (?1, ?2)",
                params![position, text],
            )?;
        }

        if established.is_none() {
            tx.execute(
                "INSERT OR REPLACE INTO index_meta (key, value) VALUES ('dimension', ?1)",
                params![dimension.to_string()],
            )?;
        }

        tx.commit()?;
        info!("Appended {} chunks for tenant '{}'", vectors.len(), tenant);
        Ok(vectors.len())
    }

    #[instrument(skip(self, query), fields(tenant = %tenant))]
    async fn search(&self, tenant: &str, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        validate_tenant_id(tenant)?;

        let Some(conn) = self.connection(tenant, false)? else {
            return Ok(Vec::new());
        };
        let conn = Self::lock_conn(&conn)?;

        let vector_count = Self::table_count(&conn, "vectors")?;
        let chunk_count = Self::table_count(&conn, "chunks")?;
        if vector_count != chunk_count {
            return Err(KildeError::IndexCorruption {
                tenant: tenant.to_string(),
                detail: format!("{} vectors but {} chunks", vector_count, chunk_count),
            });
        }
        if vector_count == 0 || k == 0 {
            return Ok(Vec::new());
        }

        if let Some(dimension) = Self::read_dimension(&conn)? {
            if query.len() != dimension {
                return Err(KildeError::DimensionMismatch {
                    expected: dimension,
                    actual: query.len(),
                });
            }
        }

        let mut stmt = conn.prepare(
            r#"
            SELECT v.embedding, c.content
            FROM vectors v
            JOIN chunks c ON c.position = v.position
            ORDER BY v.position
            "#,
        )?;

        let entries = stmt
            .query_map([], |row| {
                let embedding_bytes: Vec<u8> = row.get(0)?;
                let content: String = row.get(1)?;
                Ok((Self::bytes_to_embedding(&embedding_bytes), content))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let hits = rank_by_distance(query, entries, k);
        debug!("Found {} hits for tenant '{}'", hits.len(), tenant);
        Ok(hits)
    }

    #[instrument(skip(self), fields(tenant = %tenant))]
    async fn clear(&self, tenant: &str) -> Result<()> {
        validate_tenant_id(tenant)?;

        {
            let mut map = self.connections.lock().map_err(|e| {
                KildeError::Index(format!("Failed to acquire store lock: {}", e))
            })?;
            map.remove(tenant);
        }

        let dir = self.tenant_dir(tenant);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
            info!("Cleared knowledge base for tenant '{}'", tenant);
        }

        Ok(())
    }

    async fn chunk_count(&self, tenant: &str) -> Result<usize> {
        validate_tenant_id(tenant)?;

        let Some(conn) = self.connection(tenant, false)? else {
            return Ok(0);
        };
        let conn = Self::lock_conn(&conn)?;
        Self::table_count(&conn, "chunks")
    }

    async fn exists(&self, tenant: &str) -> Result<bool> {
        validate_tenant_id(tenant)?;
        Ok(self.db_path(tenant).exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_append_and_search_across_appends() {
        let dir = tempdir().unwrap();
        let store = SqliteTenantStore::new(dir.path()).unwrap();

        store
            .append("alice", &[vec![0.0, 0.0]], &texts(&["origin"]))
            .await
            .unwrap();
        store
            .append("alice", &[vec![3.0, 4.0], vec![1.0, 0.0]], &texts(&["far", "near"]))
            .await
            .unwrap();

        assert_eq!(store.chunk_count("alice").await.unwrap(), 3);

        let hits = store.search("alice", &[0.0, 0.0], 3).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].content, "origin");
        assert_eq!(hits[1].content, "near");
        assert_eq!(hits[2].content, "far");
        assert!((hits[2].distance - 5.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempdir().unwrap();

        {
            let store = SqliteTenantStore::new(dir.path()).unwrap();
            store
                .append("alice", &[vec![1.0, 2.0]], &texts(&["kept"]))
                .await
                .unwrap();
        }

        let store = SqliteTenantStore::new(dir.path()).unwrap();
        assert!(store.exists("alice").await.unwrap());
        assert_eq!(store.dimension("alice").unwrap(), Some(2));

        let hits = store.search("alice", &[1.0, 2.0], 1).await.unwrap();
        assert_eq!(hits[0].content, "kept");
    }

    #[tokio::test]
    async fn test_tenants_are_isolated() {
        let dir = tempdir().unwrap();
        let store = SqliteTenantStore::new(dir.path()).unwrap();

        store
            .append("alice", &[vec![1.0, 0.0]], &texts(&["alice data"]))
            .await
            .unwrap();
        store
            .append("bob", &[vec![1.0, 0.0]], &texts(&["bob data"]))
            .await
            .unwrap();

        let hits = store.search("alice", &[1.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "alice data");

        store.clear("bob").await.unwrap();
        assert!(!store.exists("bob").await.unwrap());
        assert!(store.exists("alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_search_on_unknown_tenant_is_empty() {
        let dir = tempdir().unwrap();
        let store = SqliteTenantStore::new(dir.path()).unwrap();

        let hits = store.search("nobody", &[1.0, 0.0], 5).await.unwrap();
        assert!(hits.is_empty());
        // A read must not create tenant state
        assert!(!store.exists("nobody").await.unwrap());
    }

    #[tokio::test]
    async fn test_mismatched_lengths_leave_state_unchanged() {
        let dir = tempdir().unwrap();
        let store = SqliteTenantStore::new(dir.path()).unwrap();

        store
            .append("alice", &[vec![1.0, 0.0]], &texts(&["first"]))
            .await
            .unwrap();

        let err = store
            .append("alice", &[vec![2.0, 0.0], vec![3.0, 0.0]], &texts(&["only one"]))
            .await
            .unwrap_err();
        assert!(matches!(err, KildeError::InvalidInput(_)));

        assert_eq!(store.chunk_count("alice").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let dir = tempdir().unwrap();
        let store = SqliteTenantStore::new(dir.path()).unwrap();

        store
            .append("alice", &[vec![1.0, 0.0]], &texts(&["2d"]))
            .await
            .unwrap();

        let err = store
            .append("alice", &[vec![1.0, 0.0, 0.0]], &texts(&["3d"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            KildeError::DimensionMismatch { expected: 2, actual: 3 }
        ));

        assert_eq!(store.chunk_count("alice").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clear_then_reappend_resets_dimension() {
        let dir = tempdir().unwrap();
        let store = SqliteTenantStore::new(dir.path()).unwrap();

        store
            .append("alice", &[vec![1.0, 0.0]], &texts(&["2d"]))
            .await
            .unwrap();
        store.clear("alice").await.unwrap();

        assert!(store.search("alice", &[1.0, 0.0], 5).await.unwrap().is_empty());

        // Clearing a missing knowledge base is a no-op
        store.clear("alice").await.unwrap();

        // A fresh index accepts a new dimension
        store
            .append("alice", &[vec![1.0, 0.0, 0.0]], &texts(&["3d"]))
            .await
            .unwrap();
        assert_eq!(store.dimension("alice").unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_count_mismatch_reported_as_corruption() {
        let dir = tempdir().unwrap();
        let store = SqliteTenantStore::new(dir.path()).unwrap();

        store
            .append("alice", &[vec![1.0, 0.0], vec![0.0, 1.0]], &texts(&["a", "b"]))
            .await
            .unwrap();

        // Damage one side of the pair behind the store's back
        {
            let conn = Connection::open(dir.path().join("alice").join(DB_FILE)).unwrap();
            conn.execute("DELETE FROM chunks WHERE position = 1", []).unwrap();
        }

        // Reopen so the damaged state is what gets read
        let store = SqliteTenantStore::new(dir.path()).unwrap();
        let err = store.search("alice", &[1.0, 0.0], 5).await.unwrap_err();
        assert!(matches!(err, KildeError::IndexCorruption { .. }));
    }

    #[tokio::test]
    async fn test_invalid_tenant_id_rejected() {
        let dir = tempdir().unwrap();
        let store = SqliteTenantStore::new(dir.path()).unwrap();

        let err = store
            .append("../escape", &[vec![1.0]], &texts(&["x"]))
            .await
            .unwrap_err();
        assert!(matches!(err, KildeError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_list_tenants() {
        let dir = tempdir().unwrap();
        let store = SqliteTenantStore::new(dir.path()).unwrap();

        store.append("bob", &[vec![1.0]], &texts(&["x"])).await.unwrap();
        store.append("alice", &[vec![1.0]], &texts(&["y"])).await.unwrap();

        assert_eq!(store.list_tenants().unwrap(), vec!["alice", "bob"]);
    }
}
