//! List command implementation.

use super::open_store;
use crate::cli::output::content_preview;
use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::VectorStore;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(collection: Option<String>, full: bool, settings: Settings) -> Result<()> {
    let collection = collection.unwrap_or_else(|| settings.vector_store.collection.clone());
    let store = open_store(&settings)?;

    if full {
        let documents = store.list_documents(&collection).await?;
        if documents.is_empty() {
            Output::info(&format!("Collection '{}' is empty.", collection));
            return Ok(());
        }

        Output::header(&format!("Documents in '{}' ({})", collection, documents.len()));
        for doc in &documents {
            println!();
            Output::kv("id", &doc.id);
            Output::kv("source", &doc.metadata.source_path);
            Output::kv("chunk", &doc.metadata.chunk_index.to_string());
            Output::kv("indexed", &doc.metadata.timestamp.to_rfc3339());
            Output::kv("content", &content_preview(&doc.content, 300));
        }
        return Ok(());
    }

    match store.list_sources(&collection).await {
        Ok(sources) => {
            if sources.is_empty() {
                Output::info(&format!(
                    "Nothing indexed in '{}' yet. Use 'cuerag ingest <dir>' to add documents.",
                    collection
                ));
            } else {
                Output::header(&format!("Indexed files in '{}' ({})", collection, sources.len()));
                println!();

                for source in &sources {
                    Output::source_info(
                        &source.file_name,
                        &source.source_path,
                        source.chunk_count,
                        &source.indexed_at.format("%Y-%m-%d %H:%M").to_string(),
                    );
                }

                let total_chunks: u32 = sources.iter().map(|s| s.chunk_count).sum();
                println!();
                Output::kv("Total files", &sources.len().to_string());
                Output::kv("Total chunks", &total_chunks.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list documents: {}", e));
            return Err(e.into());
        }
    }

    let others: Vec<_> = store
        .list_collections()?
        .into_iter()
        .filter(|(name, _)| *name != collection)
        .collect();
    if !others.is_empty() {
        Output::header("Other collections");
        for (name, count) in others {
            Output::list_item(&format!("{} ({} chunks)", name, count));
        }
    }

    Ok(())
}
