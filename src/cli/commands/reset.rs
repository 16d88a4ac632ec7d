//! Reset command implementation.

use super::open_store;
use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::VectorStore;
use anyhow::Result;
use console::Term;

/// Run the reset command.
pub async fn run_reset(collection: Option<String>, yes: bool, settings: Settings) -> Result<()> {
    let collection = collection.unwrap_or_else(|| settings.vector_store.collection.clone());
    let store = open_store(&settings)?;

    let count = store.document_count(&collection).await?;
    if count == 0 {
        Output::info(&format!("Collection '{}' is already empty.", collection));
        return Ok(());
    }

    if !yes && !confirm(&format!("Delete {} documents from '{}'? [y/N] ", count, collection))? {
        Output::info("Aborted.");
        return Ok(());
    }

    let removed = store.reset(&collection).await?;
    Output::success(&format!("Deleted {} documents from '{}'", removed, collection));
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    let term = Term::stderr();
    term.write_str(prompt)?;
    let answer = term.read_line()?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES\n"));
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
    }
}
