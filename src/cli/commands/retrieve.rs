//! Retrieve command implementation.

use super::{build_retriever, chat_model};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the retrieve command.
pub async fn run_retrieve(
    query: &str,
    limit: Option<usize>,
    min_score: Option<f32>,
    variants: Option<usize>,
    collection: Option<String>,
    settings: Settings,
) -> Result<()> {
    let variants = variants.unwrap_or(settings.rag.query_variants);

    if let Err(e) = preflight::check(&settings, Operation::Retrieve { variants: variants > 0 }, None).await {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let collection = collection.unwrap_or_else(|| settings.vector_store.collection.clone());
    let retriever = build_retriever(
        &settings,
        chat_model(&settings, None)?,
        &collection,
        limit.unwrap_or(settings.rag.max_context_chunks),
        min_score.unwrap_or(settings.rag.min_score),
        variants,
    )?;

    let spinner = Output::spinner("Searching...");
    let results = retriever.retrieve(query).await;
    spinner.finish_and_clear();

    match results {
        Ok(chunks) => {
            if chunks.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results in '{}'", chunks.len(), collection));

                for chunk in &chunks {
                    Output::chunk_result(
                        &chunk.file_name,
                        chunk.chunk_index,
                        chunk.score,
                        &chunk.content,
                        &chunk.source_path,
                    );
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
