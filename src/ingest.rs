//! Document ingestion: find, split, embed, and index.

use crate::chunking::Splitter;
use crate::embedding::Embedder;
use crate::error::{CueragError, Result};
use crate::vector_store::{Document, VectorStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use walkdir::WalkDir;

/// Outcome of ingesting a set of files.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Files indexed successfully.
    pub files: usize,
    /// Chunks written.
    pub chunks: usize,
    /// Files that failed, with the reason.
    pub failures: Vec<(PathBuf, String)>,
}

/// Indexes documents into one collection.
pub struct Ingestor {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    splitter: Box<dyn Splitter>,
    collection: String,
    extensions: Vec<String>,
}

impl Ingestor {
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        splitter: Box<dyn Splitter>,
        collection: &str,
    ) -> Self {
        Self {
            vector_store,
            embedder,
            splitter,
            collection: collection.to_string(),
            extensions: vec!["md".to_string()],
        }
    }

    /// Set the file extensions picked up when walking a directory.
    pub fn with_extensions(mut self, extensions: &[String]) -> Self {
        self.extensions = extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// The collection documents are written to.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Recursively list matching files under `dir`, sorted by path.
    pub fn find_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let meta = std::fs::metadata(dir).map_err(|e| CueragError::file_access(dir, e))?;
        if !meta.is_dir() {
            return Err(CueragError::InvalidInput(format!("{} is not a directory", dir.display())));
        }

        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| self.has_wanted_extension(path))
            .collect();

        files.sort();
        Ok(files)
    }

    fn has_wanted_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|want| want.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }

    /// Index one file, replacing chunks from an earlier ingestion of it.
    #[instrument(skip(self))]
    pub async fn ingest_file(&self, path: &Path) -> Result<usize> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CueragError::file_access(path, e))?;
        self.ingest_text(path, &content).await
    }

    /// Index `text` as if it were the content of `source`.
    pub async fn ingest_text(&self, source: &Path, text: &str) -> Result<usize> {
        let chunks = self.splitter.split(text);
        let source_key = source.to_string_lossy();

        let embeddings = self.embedder.embed_batch(&chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(CueragError::Embedding(format!(
                "Got {} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let documents: Vec<Document> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (chunk, embedding))| {
                Document::new(&self.collection, source, i as i32, chunk, embedding)
            })
            .collect();

        // Chunks left over from a longer previous version go too
        let count = self
            .vector_store
            .replace_source(&self.collection, &source_key, &documents)
            .await?;

        info!("Indexed {} chunks from {}", count, source_key);
        Ok(count)
    }

    /// Index the given files, continuing past per-file failures.
    pub async fn ingest_files(&self, files: &[PathBuf]) -> IngestReport {
        let mut report = IngestReport::default();

        for path in files {
            match self.ingest_file(path).await {
                Ok(count) => {
                    report.files += 1;
                    report.chunks += count;
                }
                Err(e) => {
                    warn!("Failed to ingest {:?}: {}", path, e);
                    report.failures.push((path.clone(), e.to_string()));
                }
            }
        }

        report
    }

    /// Index every matching file under `dir`.
    #[instrument(skip(self))]
    pub async fn ingest_directory(&self, dir: &Path) -> Result<IngestReport> {
        let files = self.find_files(dir)?;
        info!("Found {} files under {:?}", files.len(), dir);
        Ok(self.ingest_files(&files).await)
    }
}
