//! Context retrieval for RAG responses.

use super::ContextChunk;
use crate::config::Prompts;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::llm::ChatModel;
use crate::vector_store::VectorStore;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Builds context for a single query from the vector store.
pub struct ContextBuilder {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    collection: String,
    max_chunks: usize,
    min_score: f32,
}

impl ContextBuilder {
    /// Create a new context builder over one collection.
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        collection: &str,
    ) -> Self {
        Self {
            vector_store,
            embedder,
            collection: collection.to_string(),
            max_chunks: 4,
            min_score: 0.3,
        }
    }

    /// Set the maximum number of context chunks.
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Set the minimum similarity score threshold.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Build context for a query.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn build(&self, query: &str) -> Result<Vec<ContextChunk>> {
        let query_embedding = self.embedder.embed(query).await?;

        let results = self
            .vector_store
            .search_with_threshold(&self.collection, &query_embedding, self.max_chunks, self.min_score)
            .await?;

        debug!("Query matched {} chunks", results.len());
        Ok(results.into_iter().map(ContextChunk::from).collect())
    }
}

/// Retrieves with the original question plus model-generated rephrasings.
///
/// Each phrasing is searched separately and the hits are merged by document
/// ID, keeping the best score. With zero variants this is a plain
/// [`ContextBuilder`] lookup.
pub struct MultiQueryRetriever {
    context_builder: ContextBuilder,
    llm: Arc<dyn ChatModel>,
    prompts: Prompts,
    variants: usize,
}

impl MultiQueryRetriever {
    pub fn new(context_builder: ContextBuilder, llm: Arc<dyn ChatModel>, variants: usize) -> Self {
        Self {
            context_builder,
            llm,
            prompts: Prompts::default(),
            variants,
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Ask the model for alternative phrasings of `question`.
    ///
    /// A failing model only costs recall, so errors are logged and an empty
    /// list is returned.
    pub async fn generate_queries(&self, question: &str) -> Vec<String> {
        if self.variants == 0 {
            return Vec::new();
        }

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("count".to_string(), self.variants.to_string());
        let prompt = self.prompts.render_with_custom(&self.prompts.query.user, &vars);

        match self.llm.complete(None, &prompt).await {
            Ok(response) => {
                let queries = parse_queries(&response, question, self.variants);
                debug!("Generated queries: {:?}", queries);
                queries
            }
            Err(e) => {
                warn!("Query expansion failed, using the original question only: {}", e);
                Vec::new()
            }
        }
    }

    /// Retrieve the merged context for a question.
    #[instrument(skip(self))]
    pub async fn retrieve(&self, question: &str) -> Result<Vec<ContextChunk>> {
        let mut queries = vec![question.to_string()];
        queries.extend(self.generate_queries(question).await);

        info!("Retrieving with {} queries", queries.len());

        let results = join_all(queries.iter().map(|q| self.context_builder.build(q))).await;

        let mut merged: HashMap<String, ContextChunk> = HashMap::new();
        for result in results {
            for chunk in result? {
                let better_known = merged
                    .get(&chunk.id)
                    .is_some_and(|existing| existing.score >= chunk.score);
                if !better_known {
                    merged.insert(chunk.id.clone(), chunk);
                }
            }
        }

        let mut chunks: Vec<ContextChunk> = merged.into_values().collect();
        chunks.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(chunks)
    }
}

/// Parse newline-separated alternative questions from a model response.
///
/// List markers are stripped; blanks, duplicates and echoes of the original
/// question are skipped.
pub fn parse_queries(response: &str, original: &str, limit: usize) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(original.trim().to_lowercase());

    response
        .lines()
        .map(strip_list_marker)
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(line.to_lowercase()))
        .map(str::to_string)
        .take(limit)
        .collect()
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    let line = line.trim_start_matches(|c: char| c == '-' || c == '*' || c == '•').trim_start();

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(stripped) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return stripped.trim();
        }
    }
    line
}

/// Format context chunks for inclusion in a prompt.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "---\n[{}] {} (chunk {})\n{}\n---",
                i + 1,
                chunk.file_name,
                chunk.chunk_index,
                chunk.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format context chunks for display to the user.
pub fn format_context_for_display(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| {
            format!(
                "{} (chunk {}, score: {:.2})\n  {}",
                chunk.file_name, chunk.chunk_index, chunk.score, chunk.source_path
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{KeywordEmbedder, ScriptedChatModel};
    use crate::vector_store::{Document, MemoryVectorStore};
    use std::path::Path;

    const KEYWORDS: &[&str] = &["metering", "billing", "usage", "logging"];

    async fn seeded_store(embedder: &KeywordEmbedder) -> Arc<MemoryVectorStore> {
        let store = Arc::new(MemoryVectorStore::new());
        let texts = [
            ("metering.md", "Metering collects usage records."),
            ("billing.md", "Billing turns rated usage into invoices."),
            ("logging.md", "Logging goes to stdout."),
        ];
        for (name, text) in texts {
            let emb = embedder.embed(text).await.unwrap();
            store
                .upsert(&Document::new("c", Path::new(name), 0, text.to_string(), emb))
                .await
                .unwrap();
        }
        store
    }

    #[test]
    fn test_parse_queries() {
        let response = "1. What is metering?\n\n2) How is usage measured?\n- what is metering?\n* Explain Metering\nExplain the concepts of Metering\n";
        let queries = parse_queries(response, "Explain the concepts of Metering", 5);
        assert_eq!(
            queries,
            vec!["What is metering?", "How is usage measured?", "Explain Metering"]
        );
    }

    #[test]
    fn test_parse_queries_respects_limit() {
        let queries = parse_queries("a\nb\nc\nd", "q", 2);
        assert_eq!(queries, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_context_builder_filters_by_score() {
        let embedder = KeywordEmbedder::new(KEYWORDS);
        let store = seeded_store(&embedder).await;
        let builder = ContextBuilder::new(store, Arc::new(embedder), "c").with_min_score(0.5);

        let chunks = builder.build("how does metering work").await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].file_name, "metering.md");
    }

    #[tokio::test]
    async fn test_multi_query_merges_unique_hits() {
        let embedder = KeywordEmbedder::new(KEYWORDS);
        let store = seeded_store(&embedder).await;
        let builder = ContextBuilder::new(store, Arc::new(embedder), "c")
            .with_max_chunks(1)
            .with_min_score(0.5);
        let llm = Arc::new(ScriptedChatModel::new(vec!["what about billing\nmetering details"]));
        let retriever = MultiQueryRetriever::new(builder, llm.clone(), 3);

        let chunks = retriever.retrieve("explain metering").await.unwrap();
        let names: Vec<_> = chunks.iter().map(|c| c.file_name.as_str()).collect();
        assert_eq!(chunks.len(), 2);
        assert!(names.contains(&"metering.md"));
        assert!(names.contains(&"billing.md"));

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("explain metering"));
        assert!(prompts[0].contains("generate 3"));
    }

    #[tokio::test]
    async fn test_multi_query_survives_model_failure() {
        let embedder = KeywordEmbedder::new(KEYWORDS);
        let store = seeded_store(&embedder).await;
        let builder = ContextBuilder::new(store, Arc::new(embedder), "c").with_min_score(0.5);
        let retriever = MultiQueryRetriever::new(builder, Arc::new(ScriptedChatModel::failing()), 5);

        let chunks = retriever.retrieve("logging setup").await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].file_name, "logging.md");
    }

    #[tokio::test]
    async fn test_zero_variants_skips_model() {
        let embedder = KeywordEmbedder::new(KEYWORDS);
        let store = seeded_store(&embedder).await;
        let builder = ContextBuilder::new(store, Arc::new(embedder), "c");
        let llm = Arc::new(ScriptedChatModel::new(vec![]));
        let retriever = MultiQueryRetriever::new(builder, llm.clone(), 0);

        retriever.retrieve("billing").await.unwrap();
        assert!(llm.prompts().is_empty());
    }

    #[test]
    fn test_format_context_for_prompt() {
        let chunks = vec![ContextChunk {
            id: "a.md_chunk_0".into(),
            file_name: "a.md".into(),
            source_path: "/d/a.md".into(),
            chunk_index: 0,
            content: "Alpha".into(),
            score: 0.9,
        }];
        assert_eq!(format_context_for_prompt(&chunks), "---\n[1] a.md (chunk 0)\nAlpha\n---");
        assert!(format_context_for_display(&chunks).contains("score: 0.90"));
    }
}
