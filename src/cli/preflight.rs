//! Pre-flight checks before model-server operations.
//!
//! Confirms the local model server answers and has the needed models pulled
//! before starting work that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{CueragError, Result};
use serde::Deserialize;
use std::time::Duration;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingestion needs the embedding model.
    Ingest,
    /// Retrieval needs the embedding model, and the chat model for rephrasings.
    Retrieve { variants: bool },
    /// Asking needs both models.
    Ask,
    /// Cleanup needs the chat model.
    Clean,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Run pre-flight checks for the given operation.
///
/// `chat_model` overrides the configured chat model.
pub async fn check(settings: &Settings, operation: Operation, chat_model: Option<&str>) -> Result<()> {
    let embed = settings.embedding.model.as_str();
    let chat = chat_model.unwrap_or(settings.llm.model.as_str());
    let required: Vec<&str> = match operation {
        Operation::Ingest | Operation::Retrieve { variants: false } => vec![embed],
        Operation::Retrieve { variants: true } | Operation::Ask => vec![embed, chat],
        Operation::Clean => vec![chat],
    };

    let available = list_models(settings).await?;
    let missing = missing_models(&available, &required);
    if missing.is_empty() {
        return Ok(());
    }

    Err(CueragError::Config(format!(
        "Model(s) not available on {}: {}. Pull them with: ollama pull {}",
        settings.server.base_url,
        missing.join(", "),
        missing.join(" ")
    )))
}

async fn list_models(settings: &Settings) -> Result<Vec<String>> {
    let url = format!("{}/models", settings.server.base_url.trim_end_matches('/'));
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    let response = client
        .get(&url)
        .bearer_auth(&settings.server.api_key)
        .send()
        .await
        .map_err(|e| {
            CueragError::Config(format!(
                "Cannot reach model server at {} ({}). Is it running?",
                settings.server.base_url, e
            ))
        })?
        .error_for_status()?;

    let list: ModelList = response.json().await?;
    Ok(list.data.into_iter().map(|m| m.id).collect())
}

fn same_model(have: &str, want: &str) -> bool {
    have == want
        || have.strip_suffix(":latest") == Some(want)
        || want.strip_suffix(":latest") == Some(have)
}

/// Models from `required` the server does not list.
///
/// A bare name matches its `:latest` tag.
pub fn missing_models(available: &[String], required: &[&str]) -> Vec<String> {
    let mut missing: Vec<String> = required
        .iter()
        .filter(|want| !available.iter().any(|have| same_model(have, want)))
        .map(|m| m.to_string())
        .collect();
    missing.dedup();
    missing
}
