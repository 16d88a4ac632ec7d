//! Chat model access for answering and cleanup.

mod server;

pub use server::ServerChatModel;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for text completion by a chat model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete a single-turn prompt, optionally with a system message.
    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String>;

    /// Name of the model.
    fn model(&self) -> &str;
}
