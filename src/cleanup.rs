//! Model-assisted cleanup of spoken transcript text.

use crate::config::Prompts;
use crate::error::{CueragError, Result};
use crate::llm::ChatModel;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Rewrites raw transcript text into readable prose.
pub struct TranscriptCleaner {
    llm: Arc<dyn ChatModel>,
    prompts: Prompts,
}

impl TranscriptCleaner {
    pub fn new(llm: Arc<dyn ChatModel>) -> Self {
        Self {
            llm,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Build the cleanup prompt for `text` spoken by `speaker`.
    pub fn prompt(&self, text: &str, speaker: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("text".to_string(), text.to_string());
        vars.insert("speaker".to_string(), speaker.to_string());
        self.prompts.render_with_custom(&self.prompts.cleanup.user, &vars)
    }

    /// Clean `text`, attributed to `speaker`.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn clean(&self, text: &str, speaker: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(CueragError::InvalidInput("Nothing to clean: text is empty".into()));
        }

        let prompt = self.prompt(text, speaker);
        let cleaned = self.llm.complete(None, &prompt).await?;

        info!("Cleaned {} chars into {} chars", text.len(), cleaned.len());
        Ok(cleaned.trim().to_string())
    }
}
