//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{rank, Document, IndexedSource, SearchResult, VectorStore};
use crate::error::{CueragError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

type Key = (String, String);

/// In-memory vector store.
pub struct MemoryVectorStore {
    documents: RwLock<HashMap<Key, Document>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }

    fn key(doc: &Document) -> Key {
        (doc.collection.clone(), doc.id.clone())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<Key, Document>>> {
        self.documents
            .read()
            .map_err(|e| CueragError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<Key, Document>>> {
        self.documents
            .write()
            .map_err(|e| CueragError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, doc: &Document) -> Result<()> {
        self.write()?.insert(Self::key(doc), doc.clone());
        Ok(())
    }

    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let mut store = self.write()?;
        for doc in docs {
            store.insert(Self::key(doc), doc.clone());
        }
        Ok(docs.len())
    }

    async fn search(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        self.search_with_threshold(collection, query_embedding, limit, f32::MIN)
            .await
    }

    async fn search_with_threshold(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let docs = self.read()?;
        let candidates = docs
            .values()
            .filter(|d| d.collection == collection)
            .cloned();
        Ok(rank(candidates, query_embedding, limit, min_score))
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>> {
        let docs = self.read()?;
        let mut result: Vec<Document> = docs
            .values()
            .filter(|d| d.collection == collection)
            .cloned()
            .collect();
        result.sort_by(|a, b| {
            a.metadata
                .source_path
                .cmp(&b.metadata.source_path)
                .then(a.metadata.chunk_index.cmp(&b.metadata.chunk_index))
        });
        Ok(result)
    }

    async fn list_sources(&self, collection: &str) -> Result<Vec<IndexedSource>> {
        let docs = self.read()?;
        let mut sources: BTreeMap<String, IndexedSource> = BTreeMap::new();

        for doc in docs.values().filter(|d| d.collection == collection) {
            let entry = sources
                .entry(doc.metadata.source_path.clone())
                .or_insert_with(|| IndexedSource {
                    file_name: doc.metadata.file_name.clone(),
                    source_path: doc.metadata.source_path.clone(),
                    chunk_count: 0,
                    indexed_at: doc.metadata.timestamp,
                });
            entry.chunk_count += 1;
            entry.indexed_at = entry.indexed_at.max(doc.metadata.timestamp);
        }

        Ok(sources.into_values().collect())
    }

    async fn delete_by_source(&self, collection: &str, source_path: &str) -> Result<usize> {
        let mut docs = self.write()?;
        let before = docs.len();
        docs.retain(|_, d| !(d.collection == collection && d.metadata.source_path == source_path));
        Ok(before - docs.len())
    }

    async fn replace_source(
        &self,
        collection: &str,
        source_path: &str,
        docs: &[Document],
    ) -> Result<usize> {
        let mut store = self.write()?;
        store.retain(|_, d| !(d.collection == collection && d.metadata.source_path == source_path));
        for doc in docs {
            store.insert(Self::key(doc), doc.clone());
        }
        Ok(docs.len())
    }

    async fn document_count(&self, collection: &str) -> Result<usize> {
        Ok(self.read()?.values().filter(|d| d.collection == collection).count())
    }

    async fn reset(&self, collection: &str) -> Result<usize> {
        let mut docs = self.write()?;
        let before = docs.len();
        docs.retain(|_, d| d.collection != collection);
        Ok(before - docs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = MemoryVectorStore::new();
        store
            .upsert(&Document::new("a", Path::new("x.md"), 0, "one".into(), vec![1.0, 0.0]))
            .await
            .unwrap();
        store
            .upsert(&Document::new("b", Path::new("x.md"), 0, "two".into(), vec![1.0, 0.0]))
            .await
            .unwrap();

        assert_eq!(store.document_count("a").await.unwrap(), 1);
        let hits = store.search("b", &[1.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document.content, "two");

        assert_eq!(store.reset("a").await.unwrap(), 1);
        assert_eq!(store.document_count("a").await.unwrap(), 0);
        assert_eq!(store.document_count("b").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_replace_source_leaves_other_sources() {
        let store = MemoryVectorStore::new();
        let a0 = Document::new("c", Path::new("/d/a.md"), 0, "a0".into(), vec![1.0]);
        let a1 = Document::new("c", Path::new("/d/a.md"), 1, "a1".into(), vec![1.0]);
        let b0 = Document::new("c", Path::new("/d/b.md"), 0, "b0".into(), vec![1.0]);
        store.upsert_batch(&[a0, a1, b0]).await.unwrap();

        let fresh = Document::new("c", Path::new("/d/a.md"), 0, "fresh".into(), vec![1.0]);
        assert_eq!(store.replace_source("c", "/d/a.md", &[fresh]).await.unwrap(), 1);

        let mut contents: Vec<_> = store
            .list_documents("c")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.content)
            .collect();
        contents.sort();
        assert_eq!(contents, vec!["b0", "fresh"]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_id() {
        let store = MemoryVectorStore::new();
        let first = Document::new("c", Path::new("/d/x.md"), 0, "old".into(), vec![1.0]);
        let second = Document::new("c", Path::new("/d/x.md"), 0, "new".into(), vec![1.0]);
        store.upsert_batch(&[first, second]).await.unwrap();

        let docs = store.list_documents("c").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "new");

        let sources = store.list_sources("c").await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].chunk_count, 1);
    }
}
