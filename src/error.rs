//! Error types for cuerag.

use std::path::PathBuf;
use thiserror::Error;

/// Library-level error type for cuerag operations.
#[derive(Error, Debug)]
pub enum CueragError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot read {path}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Chunking failed: {0}")]
    Chunking(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Language model error: {0}")]
    Llm(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("RAG error: {0}")]
    Rag(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Model server error: {0}")]
    OpenAI(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CueragError {
    /// Wrap an I/O error with the path that failed.
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CueragError::FileAccess {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for cuerag operations.
pub type Result<T> = std::result::Result<T, CueragError>;
