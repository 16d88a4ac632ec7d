//! Cuerag - speaker captions and local RAG
//!
//! A local-first CLI tool for pulling one speaker's words out of WebVTT
//! captions and answering questions over a Markdown knowledge base with a
//! locally hosted model server.
//!
//! # Overview
//!
//! Cuerag allows you to:
//! - Extract everything one speaker said from a `.vtt` caption file
//! - Clean up spoken text into readable prose with a local model
//! - Index a directory of Markdown documents into a vector store
//! - Retrieve relevant chunks and ask questions grounded in them
//!
//! # Architecture
//!
//! - `transcript` - Speaker utterance extraction from caption files
//! - `config` - Configuration and prompt templates
//! - `openai` - Client for the OpenAI-compatible model server
//! - `embedding` - Embedding generation
//! - `llm` - Chat completions
//! - `chunking` - Markdown-aware text splitting
//! - `vector_store` - Vector database abstraction
//! - `ingest` - Document ingestion pipeline
//! - `rag` - Retrieval and question answering
//! - `cleanup` - Transcript cleanup
//!
//! # Example
//!
//! ```rust,no_run
//! use cuerag::transcript::SpeakerExtractor;
//! use std::path::Path;
//!
//! fn main() -> cuerag::Result<()> {
//!     let extractor = SpeakerExtractor::new("Kai", "Merklein")?;
//!     for utterance in extractor.extract(Path::new("meeting.vtt"))? {
//!         println!("{}", utterance);
//!     }
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod openai;
pub mod rag;
pub mod transcript;
pub mod vector_store;

#[cfg(test)]
mod testing;

pub use error::{CueragError, Result};
