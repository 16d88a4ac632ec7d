//! Chat completions from the local model server.

use super::ChatModel;
use crate::config::Settings;
use crate::error::{CueragError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Chat model backed by the server's `/chat/completions` endpoint.
pub struct ServerChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl ServerChatModel {
    /// Create a chat model from application settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: create_client(&settings.server)?,
            model: settings.llm.model.clone(),
            temperature: settings.llm.temperature,
        })
    }

    /// Override the model name.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Override the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn build_messages(system: Option<&str>, prompt: &str) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(2);

        if let Some(system) = system {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .map_err(|e| CueragError::Llm(e.to_string()))?
                    .into(),
            );
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| CueragError::Llm(e.to_string()))?
                .into(),
        );

        Ok(messages)
    }
}

#[async_trait]
impl ChatModel for ServerChatModel {
    #[instrument(skip(self, system, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(Self::build_messages(system, prompt)?)
            .temperature(self.temperature)
            .build()
            .map_err(|e| CueragError::Llm(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            CueragError::OpenAI(format!("Failed to generate response: {}", e))
        })?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| CueragError::Llm("Empty response from model".to_string()))?
            .clone();

        debug!("Model returned {} chars", content.len());
        Ok(content)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
