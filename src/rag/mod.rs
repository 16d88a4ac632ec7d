//! RAG (Retrieval-Augmented Generation) over an ingested collection.
//!
//! Provides retrieval of relevant chunks and question answering grounded in them.

pub mod context;
mod response;

pub use context::{ContextBuilder, MultiQueryRetriever};
pub use response::{RagEngine, RagResponse};

use crate::vector_store::SearchResult;

/// A retrieved chunk prepared for prompting and display.
#[derive(Debug, Clone)]
pub struct ContextChunk {
    /// Document ID.
    pub id: String,
    /// Source file name.
    pub file_name: String,
    /// Source path.
    pub source_path: String,
    /// Position of the chunk in its source.
    pub chunk_index: i32,
    /// Text content.
    pub content: String,
    /// Similarity score.
    pub score: f32,
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        let doc = result.document;
        Self {
            id: doc.id,
            file_name: doc.metadata.file_name,
            source_path: doc.metadata.source_path,
            chunk_index: doc.metadata.chunk_index,
            content: doc.content,
            score: result.score,
        }
    }
}
