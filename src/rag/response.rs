//! RAG response generation.

use super::{context::format_context_for_prompt, ContextChunk, MultiQueryRetriever};
use crate::config::Prompts;
use crate::error::Result;
use crate::llm::ChatModel;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// RAG engine for question answering.
pub struct RagEngine {
    retriever: MultiQueryRetriever,
    llm: Arc<dyn ChatModel>,
    prompts: Prompts,
}

impl RagEngine {
    /// Create a new RAG engine.
    pub fn new(retriever: MultiQueryRetriever, llm: Arc<dyn ChatModel>) -> Self {
        Self {
            retriever,
            llm,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.retriever = self.retriever.with_prompts(prompts.clone());
        self.prompts = prompts;
        self
    }

    /// Retrieve context only, without generating an answer.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<ContextChunk>> {
        self.retriever.retrieve(question).await
    }

    /// Ask a single question and get a response.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn ask(&self, question: &str) -> Result<RagResponse> {
        info!("Processing question: {}", question);

        let context_chunks = self.retriever.retrieve(question).await?;

        if context_chunks.is_empty() {
            return Ok(RagResponse {
                answer: self.prompts.rag.no_context.clone(),
                sources: Vec::new(),
            });
        }

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), format_context_for_prompt(&context_chunks));

        let user_prompt = self.prompts.render_with_custom(&self.prompts.rag.user, &vars);
        let answer = self
            .llm
            .complete(Some(&self.prompts.rag.system), &user_prompt)
            .await?;

        debug!("Generated response with {} sources", context_chunks.len());

        Ok(RagResponse {
            answer,
            sources: context_chunks,
        })
    }
}

/// A RAG response with answer and sources.
#[derive(Debug, Clone)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Source chunks used for the answer.
    pub sources: Vec<ContextChunk>,
}

impl RagResponse {
    /// Format the response for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();

        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            for source in &self.sources {
                output.push_str(&format!(
                    "\n{} (chunk {}, score: {:.2})",
                    source.file_name, source.chunk_index, source.score
                ));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::Embedder;
    use crate::rag::ContextBuilder;
    use crate::testing::{KeywordEmbedder, ScriptedChatModel};
    use crate::vector_store::{Document, MemoryVectorStore, VectorStore};
    use std::path::Path;

    async fn engine(llm: Arc<ScriptedChatModel>) -> RagEngine {
        let embedder = KeywordEmbedder::new(&["metering", "billing"]);
        let store = Arc::new(MemoryVectorStore::new());
        let text = "Metering records every API call.";
        store
            .upsert(&Document::new(
                "c",
                Path::new("/d/metering.md"),
                0,
                text.to_string(),
                embedder.embed(text).await.unwrap(),
            ))
            .await
            .unwrap();

        let builder = ContextBuilder::new(store, Arc::new(embedder), "c").with_min_score(0.5);
        let retriever = MultiQueryRetriever::new(builder, llm.clone(), 0);
        RagEngine::new(retriever, llm)
    }

    #[tokio::test]
    async fn test_ask_uses_context() {
        let llm = Arc::new(ScriptedChatModel::new(vec!["It records API calls."]));
        let engine = engine(llm.clone()).await;

        let response = engine.ask("What is metering?").await.unwrap();
        assert_eq!(response.answer, "It records API calls.");
        assert_eq!(response.sources.len(), 1);

        let prompts = llm.prompts();
        assert!(prompts[0].starts_with("Answer the question based ONLY on the following context:"));
        assert!(prompts[0].contains("Metering records every API call."));
        assert!(prompts[0].contains("Question: What is metering?"));

        let shown = response.format_for_display();
        assert!(shown.contains("--- Sources ---"));
        assert!(shown.contains("metering.md (chunk 0"));
    }

    #[tokio::test]
    async fn test_ask_without_context_skips_model() {
        let llm = Arc::new(ScriptedChatModel::new(vec![]));
        let engine = engine(llm.clone()).await;

        let response = engine.ask("How does billing work?").await.unwrap();
        assert!(response.sources.is_empty());
        assert_eq!(response.answer, Prompts::default().rag.no_context);
        assert!(llm.prompts().is_empty());
    }
}
