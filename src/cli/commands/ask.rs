//! Ask command implementation.

use super::{build_retriever, chat_model, load_prompts};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::RagEngine;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    max_chunks: Option<usize>,
    variants: Option<usize>,
    collection: Option<String>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(&settings, Operation::Ask, model.as_deref()).await {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let collection = collection.unwrap_or_else(|| settings.vector_store.collection.clone());
    let llm = chat_model(&settings, model.as_deref())?;

    let retriever = build_retriever(
        &settings,
        llm.clone(),
        &collection,
        max_chunks.unwrap_or(settings.rag.max_context_chunks),
        settings.rag.min_score,
        variants.unwrap_or(settings.rag.query_variants),
    )?;
    let engine = RagEngine::new(retriever, llm).with_prompts(load_prompts(&settings)?);

    let spinner = Output::spinner("Searching knowledge base...");

    match engine.ask(question).await {
        Ok(response) => {
            spinner.finish_and_clear();

            println!("\n{}\n", response.answer);

            if !response.sources.is_empty() {
                Output::header("Sources");
                for source in &response.sources {
                    Output::chunk_result(
                        &source.file_name,
                        source.chunk_index,
                        source.score,
                        &source.content,
                        &source.source_path,
                    );
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
