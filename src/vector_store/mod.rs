//! Vector store abstraction for cuerag.
//!
//! Provides a trait-based interface for different vector database backends.
//! Every operation is scoped to a named collection.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metadata stored alongside each chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// File name of the source document.
    pub file_name: String,
    /// Full path of the source document at ingestion time.
    pub source_path: String,
    /// Position of this chunk within its source.
    pub chunk_index: i32,
    /// When this chunk was indexed.
    pub timestamp: DateTime<Utc>,
}

/// A chunk stored in the vector database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// `{file_name}_chunk_{index}`; re-ingesting a file replaces its chunks.
    pub id: String,
    /// Collection this document belongs to.
    pub collection: String,
    /// Text content of this chunk.
    pub content: String,
    /// Source metadata.
    pub metadata: DocumentMetadata,
    /// Embedding vector.
    pub embedding: Vec<f32>,
}

impl Document {
    /// Create a new document for chunk `chunk_index` of `source`.
    pub fn new(
        collection: &str,
        source: &Path,
        chunk_index: i32,
        content: String,
        embedding: Vec<f32>,
    ) -> Self {
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.to_string_lossy().into_owned());

        Self {
            id: Self::chunk_id(&file_name, chunk_index),
            collection: collection.to_string(),
            content,
            metadata: DocumentMetadata {
                file_name,
                source_path: source.to_string_lossy().into_owned(),
                chunk_index,
                timestamp: Utc::now(),
            },
            embedding,
        }
    }

    /// Document ID for a chunk of a file.
    pub fn chunk_id(file_name: &str, chunk_index: i32) -> String {
        format!("{}_chunk_{}", file_name, chunk_index)
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched document.
    pub document: Document,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Summary information about an indexed source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedSource {
    /// Source file name.
    pub file_name: String,
    /// Source path.
    pub source_path: String,
    /// Number of indexed chunks.
    pub chunk_count: u32,
    /// When the source was last indexed.
    pub indexed_at: DateTime<Utc>,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store a document with its embedding, replacing one with the same ID.
    async fn upsert(&self, doc: &Document) -> Result<()>;

    /// Bulk upsert documents.
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize>;

    /// Search for similar documents.
    async fn search(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Search with a minimum similarity threshold.
    async fn search_with_threshold(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>>;

    /// All documents of a collection, ordered by source and chunk index.
    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>>;

    /// Indexed source files of a collection.
    async fn list_sources(&self, collection: &str) -> Result<Vec<IndexedSource>>;

    /// Delete the chunks of one source file.
    async fn delete_by_source(&self, collection: &str, source_path: &str) -> Result<usize>;

    /// Atomically swap the chunks of one source file for `docs`.
    ///
    /// On error the previous chunks are left in place.
    async fn replace_source(
        &self,
        collection: &str,
        source_path: &str,
        docs: &[Document],
    ) -> Result<usize>;

    /// Number of documents in a collection.
    async fn document_count(&self, collection: &str) -> Result<usize>;

    /// Remove every document of a collection.
    async fn reset(&self, collection: &str) -> Result<usize>;
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

/// Score, filter and rank documents against a query embedding.
pub(crate) fn rank(
    docs: impl IntoIterator<Item = Document>,
    query_embedding: &[f32],
    limit: usize,
    min_score: f32,
) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = docs
        .into_iter()
        .map(|doc| {
            let score = cosine_similarity(query_embedding, &doc.embedding);
            SearchResult { document: doc, score }
        })
        .filter(|r| r.score >= min_score)
        .collect();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(limit);
    results
}
