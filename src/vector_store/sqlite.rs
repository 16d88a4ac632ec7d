//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity.
//! Collections of a few thousand chunks are scanned comfortably; larger
//! corpora would want the sqlite-vec extension or a dedicated vector database.

use super::{rank, Document, DocumentMetadata, IndexedSource, SearchResult, VectorStore};
use crate::error::{CueragError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        content TEXT NOT NULL,
        file_name TEXT NOT NULL,
        source_path TEXT NOT NULL,
        chunk_index INTEGER NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL,
        PRIMARY KEY (collection, id)
    );

    CREATE INDEX IF NOT EXISTS idx_documents_source ON documents(collection, source_path);
"#;

const SELECT_DOCUMENT: &str = r#"
    SELECT collection, id, content, file_name, source_path, chunk_index, embedding, indexed_at
    FROM documents
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open or create a SQLite vector store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| CueragError::VectorStore(format!("Failed to acquire lock: {}", e)))
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

    fn parse_timestamp(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
        let embedding_bytes: Vec<u8> = row.get(6)?;
        let indexed_at: String = row.get(7)?;

        Ok(Document {
            collection: row.get(0)?,
            id: row.get(1)?,
            content: row.get(2)?,
            metadata: DocumentMetadata {
                file_name: row.get(3)?,
                source_path: row.get(4)?,
                chunk_index: row.get(5)?,
                timestamp: Self::parse_timestamp(&indexed_at),
            },
            embedding: Self::bytes_to_embedding(&embedding_bytes),
        })
    }

    fn insert(conn: &Connection, doc: &Document) -> Result<()> {
        conn.execute(
            r#"
            INSERT OR REPLACE INTO documents
            (collection, id, content, file_name, source_path, chunk_index, embedding, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                doc.collection,
                doc.id,
                doc.content,
                doc.metadata.file_name,
                doc.metadata.source_path,
                doc.metadata.chunk_index,
                Self::embedding_to_bytes(&doc.embedding),
                doc.metadata.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn query_documents(&self, collection: &str, order: &str) -> Result<Vec<Document>> {
        let conn = self.lock()?;
        let sql = format!("{} WHERE collection = ?1 {}", SELECT_DOCUMENT, order);
        let mut stmt = conn.prepare(&sql)?;
        let docs = stmt
            .query_map(params![collection], Self::row_to_document)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(docs)
    }

    /// Collections present in the database with their document counts.
    pub fn list_collections(&self) -> Result<Vec<(String, usize)>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT collection, COUNT(*) FROM documents GROUP BY collection ORDER BY collection",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let name: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((name, count as usize))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, doc), fields(id = %doc.id))]
    async fn upsert(&self, doc: &Document) -> Result<()> {
        let conn = self.lock()?;
        Self::insert(&conn, doc)?;
        debug!("Upserted document {}", doc.id);
        Ok(())
    }

    #[instrument(skip(self, docs), fields(count = docs.len()))]
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for doc in docs {
            Self::insert(&tx, doc)?;
        }

        tx.commit()?;
        info!("Batch upserted {} documents", docs.len());
        Ok(docs.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        self.search_with_threshold(collection, query_embedding, limit, f32::MIN)
            .await
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_with_threshold(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let docs = self.query_documents(collection, "")?;
        let results = rank(docs, query_embedding, limit, min_score);
        debug!("Found {} matching documents", results.len());
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>> {
        self.query_documents(collection, "ORDER BY source_path, chunk_index")
    }

    #[instrument(skip(self))]
    async fn list_sources(&self, collection: &str) -> Result<Vec<IndexedSource>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT file_name, source_path, COUNT(*) as chunk_count, MAX(indexed_at) as indexed_at
            FROM documents
            WHERE collection = ?1
            GROUP BY source_path
            ORDER BY source_path
            "#,
        )?;

        let sources = stmt
            .query_map(params![collection], |row| {
                let indexed_at: String = row.get(3)?;
                Ok(IndexedSource {
                    file_name: row.get(0)?,
                    source_path: row.get(1)?,
                    chunk_count: row.get(2)?,
                    indexed_at: Self::parse_timestamp(&indexed_at),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(sources)
    }

    #[instrument(skip(self))]
    async fn delete_by_source(&self, collection: &str, source_path: &str) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND source_path = ?2",
            params![collection, source_path],
        )?;

        debug!("Deleted {} documents for {}", deleted, source_path);
        Ok(deleted)
    }

    #[instrument(skip(self, docs), fields(count = docs.len()))]
    async fn replace_source(
        &self,
        collection: &str,
        source_path: &str,
        docs: &[Document],
    ) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let deleted = tx.execute(
            "DELETE FROM documents WHERE collection = ?1 AND source_path = ?2",
            params![collection, source_path],
        )?;
        for doc in docs {
            Self::insert(&tx, doc)?;
        }

        tx.commit()?;
        debug!("Replaced {} chunks of {} with {}", deleted, source_path, docs.len());
        Ok(docs.len())
    }

    async fn document_count(&self, collection: &str) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    #[instrument(skip(self))]
    async fn reset(&self, collection: &str) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM documents WHERE collection = ?1",
            params![collection],
        )?;

        info!("Reset collection '{}' ({} documents removed)", collection, deleted);
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(collection: &str, path: &str, index: i32, content: &str, embedding: Vec<f32>) -> Document {
        Document::new(collection, Path::new(path), index, content.to_string(), embedding)
    }

    #[tokio::test]
    async fn test_sqlite_vector_store() {
        let store = SqliteVectorStore::in_memory().unwrap();

        store
            .upsert(&doc("Guides", "/d/metering.md", 0, "Metering basics", vec![1.0, 0.0, 0.0]))
            .await
            .unwrap();

        let sources = store.list_sources("Guides").await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].file_name, "metering.md");

        let results = store.search("Guides", &[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!((results[0].score - 1.0).abs() < 0.001);
        assert_eq!(results[0].document.embedding, vec![1.0, 0.0, 0.0]);

        let deleted = store.delete_by_source("Guides", "/d/metering.md").await.unwrap();
        assert_eq!(deleted, 1);
        assert!(store.list_sources("Guides").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_threshold_and_listing_order() {
        let store = SqliteVectorStore::in_memory().unwrap();
        store
            .upsert_batch(&[
                doc("c", "/d/b.md", 1, "b1", vec![0.0, 1.0]),
                doc("c", "/d/b.md", 0, "b0", vec![1.0, 0.0]),
                doc("c", "/d/a.md", 0, "a0", vec![1.0, 1.0]),
                doc("other", "/d/a.md", 0, "x", vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let hits = store
            .search_with_threshold("c", &[1.0, 0.0], 10, 0.5)
            .await
            .unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.document.id.as_str()).collect();
        assert_eq!(ids, vec!["b.md_chunk_0", "a.md_chunk_0"]);

        let listed: Vec<_> = store
            .list_documents("c")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.content)
            .collect();
        assert_eq!(listed, vec!["a0", "b0", "b1"]);

        assert_eq!(
            store.list_collections().unwrap(),
            vec![("c".to_string(), 3), ("other".to_string(), 1)]
        );

        assert_eq!(store.reset("c").await.unwrap(), 3);
        assert_eq!(store.document_count("c").await.unwrap(), 0);
        assert_eq!(store.document_count("other").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_replace_source_swaps_chunks() {
        let store = SqliteVectorStore::in_memory().unwrap();
        store
            .upsert_batch(&[
                doc("c", "/d/a.md", 0, "old0", vec![1.0]),
                doc("c", "/d/a.md", 1, "old1", vec![1.0]),
                doc("c", "/d/b.md", 0, "other", vec![1.0]),
            ])
            .await
            .unwrap();

        let written = store
            .replace_source("c", "/d/a.md", &[doc("c", "/d/a.md", 0, "new0", vec![1.0])])
            .await
            .unwrap();
        assert_eq!(written, 1);

        let contents: Vec<_> = store
            .list_documents("c")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.content)
            .collect();
        assert_eq!(contents, vec!["new0", "other"]);
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_old_chunks() {
        let store = SqliteVectorStore::in_memory().unwrap();
        store
            .upsert(&doc("c", "/d/a.md", 0, "old", vec![1.0]))
            .await
            .unwrap();
        store
            .lock()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject BEFORE INSERT ON documents WHEN NEW.content = 'bad' \
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let replacement = [
            doc("c", "/d/a.md", 0, "good", vec![1.0]),
            doc("c", "/d/a.md", 1, "bad", vec![1.0]),
        ];
        assert!(store.replace_source("c", "/d/a.md", &replacement).await.is_err());

        let docs = store.list_documents("c").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "old");
    }

    #[tokio::test]
    async fn test_persists_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db").join("vectors.db");

        {
            let store = SqliteVectorStore::new(&path).unwrap();
            store
                .upsert(&doc("c", "/d/a.md", 0, "kept", vec![0.5, 0.5]))
                .await
                .unwrap();
        }

        let reopened = SqliteVectorStore::new(&path).unwrap();
        let docs = reopened.list_documents("c").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "kept");
    }
}
