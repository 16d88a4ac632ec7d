//! CLI command implementations.

mod ask;
mod clean;
mod config;
mod ingest;
mod list;
mod reset;
mod retrieve;
mod speaker;

pub use ask::run_ask;
pub use clean::run_clean;
pub use config::run_config;
pub use ingest::run_ingest;
pub use list::run_list;
pub use reset::run_reset;
pub use retrieve::run_retrieve;
pub use speaker::run_speaker;

use crate::config::{Prompts, Settings};
use crate::embedding::ServerEmbedder;
use crate::llm::ServerChatModel;
use crate::rag::{ContextBuilder, MultiQueryRetriever};
use crate::vector_store::SqliteVectorStore;
use anyhow::Result;
use std::sync::Arc;

fn open_store(settings: &Settings) -> Result<Arc<SqliteVectorStore>> {
    Ok(Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?))
}

fn load_prompts(settings: &Settings) -> Result<Prompts> {
    Ok(Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?)
}

fn chat_model(settings: &Settings, model: Option<&str>) -> Result<Arc<ServerChatModel>> {
    let mut llm = ServerChatModel::from_settings(settings)?;
    if let Some(model) = model {
        llm = llm.with_model(model);
    }
    Ok(Arc::new(llm))
}

/// Build a retriever over `collection` with the configured server models.
fn build_retriever(
    settings: &Settings,
    llm: Arc<ServerChatModel>,
    collection: &str,
    max_chunks: usize,
    min_score: f32,
    variants: usize,
) -> Result<MultiQueryRetriever> {
    let store = open_store(settings)?;
    let embedder = Arc::new(ServerEmbedder::from_settings(settings)?);

    let builder = ContextBuilder::new(store, embedder, collection)
        .with_max_chunks(max_chunks)
        .with_min_score(min_score);

    Ok(MultiQueryRetriever::new(builder, llm, variants).with_prompts(load_prompts(settings)?))
}
