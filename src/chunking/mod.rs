//! Text splitting for documents before embedding.

mod markdown;

pub use markdown::MarkdownSplitter;

/// Trait for text splitting implementations.
pub trait Splitter: Send + Sync {
    /// Split a text into chunks, in document order.
    fn split(&self, text: &str) -> Vec<String>;
}

/// Configuration for chunking.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Characters carried over from the previous chunk.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 4000,
            chunk_overlap: 200,
        }
    }
}

impl From<&crate::config::ChunkingSettings> for ChunkingConfig {
    fn from(settings: &crate::config::ChunkingSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        }
    }
}
