//! Configuration module for cuerag.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{CleanupPrompts, Prompts, QueryPrompts, RagPrompts};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, LlmSettings, PromptSettings,
    RagSettings, ServerSettings, Settings, VectorStoreSettings,
};
