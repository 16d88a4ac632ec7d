//! Ingest command implementation.

use super::open_store;
use crate::chunking::{ChunkingConfig, MarkdownSplitter};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::ServerEmbedder;
use crate::ingest::{IngestReport, Ingestor};
use crate::vector_store::VectorStore;
use anyhow::Result;
use std::sync::Arc;

/// Run the ingest command.
pub async fn run_ingest(
    directory: &str,
    collection: Option<String>,
    reset: bool,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(&settings, Operation::Ingest, None).await {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let collection = collection.unwrap_or_else(|| settings.vector_store.collection.clone());
    let store = open_store(&settings)?;

    if reset {
        let removed = store.reset(&collection).await?;
        Output::info(&format!("Cleared {} documents from '{}'", removed, collection));
    }

    let splitter = MarkdownSplitter::new(ChunkingConfig::from(&settings.chunking))?;
    let ingestor = Ingestor::new(
        store,
        Arc::new(ServerEmbedder::from_settings(&settings)?),
        Box::new(splitter),
        &collection,
    )
    .with_extensions(&settings.chunking.extensions);

    let dir = Settings::expand_path(directory);
    let files = match ingestor.find_files(&dir) {
        Ok(files) => files,
        Err(e) => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    if files.is_empty() {
        Output::warning(&format!("No matching files under {}", dir.display()));
        return Ok(());
    }

    let pb = Output::progress_bar(files.len() as u64, "Ingesting");
    let mut report = IngestReport::default();
    for file in &files {
        if let Some(name) = file.file_name() {
            pb.set_message(name.to_string_lossy().to_string());
        }
        let step = ingestor.ingest_files(std::slice::from_ref(file)).await;
        report.files += step.files;
        report.chunks += step.chunks;
        report.failures.extend(step.failures);
        pb.inc(1);
    }
    pb.finish_and_clear();

    Output::success(&format!(
        "Indexed {} chunks from {} files into '{}'",
        report.chunks, report.files, collection
    ));

    if !report.failures.is_empty() {
        Output::warning(&format!("{} files failed:", report.failures.len()));
        for (path, reason) in &report.failures {
            Output::list_item(&format!("{}: {}", path.display(), reason));
        }
    }

    Ok(())
}
