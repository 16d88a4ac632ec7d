//! Markdown-aware recursive splitting.
//!
//! Text is cut at the coarsest markdown boundary present (headings, code
//! fences, horizontal rules, paragraphs, lines, words, then characters).
//! Pieces below the chunk size are merged back greedily, keeping up to
//! `chunk_overlap` characters of the previous chunk at the start of the next.

use super::{ChunkingConfig, Splitter};
use crate::error::{CueragError, Result};
use regex::Regex;
use std::collections::VecDeque;

const MARKDOWN_SEPARATORS: &[&str] = &[
    r"\n#{1,6} ",
    r"```\n",
    r"\n\*\*\*+\n",
    r"\n---+\n",
    r"\n___+\n",
    r"\n\n",
    r"\n",
    r" ",
];

enum Separator {
    Pattern(Regex),
    /// Last resort: every character is a piece.
    Chars,
}

impl Separator {
    fn occurs_in(&self, text: &str) -> bool {
        match self {
            Separator::Pattern(re) => re.is_match(text),
            Separator::Chars => true,
        }
    }

    /// Split keeping each separator at the start of the piece that follows it.
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        match self {
            Separator::Pattern(re) => {
                let mut pieces = Vec::new();
                let mut start = 0;
                for m in re.find_iter(text) {
                    if m.start() > start {
                        pieces.push(&text[start..m.start()]);
                    }
                    start = m.start();
                }
                if start < text.len() {
                    pieces.push(&text[start..]);
                }
                pieces
            }
            Separator::Chars => text
                .char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect(),
        }
    }
}

/// Recursive character splitter tuned for markdown documents.
pub struct MarkdownSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<Separator>,
}

impl MarkdownSplitter {
    /// Create a splitter. Overlap must be smaller than the chunk size.
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(CueragError::InvalidInput("chunk_size must be positive".to_string()));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(CueragError::InvalidInput(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }

        let mut separators = MARKDOWN_SEPARATORS
            .iter()
            .map(|p| {
                Regex::new(p)
                    .map(Separator::Pattern)
                    .map_err(|e| CueragError::Chunking(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        separators.push(Separator::Chars);

        Ok(Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            separators,
        })
    }

    fn split_recursive(&self, text: &str, separators: &[Separator]) -> Vec<String> {
        let Some((index, separator)) = separators
            .iter()
            .enumerate()
            .find(|(_, sep)| sep.occurs_in(text))
        else {
            return vec![text.to_string()];
        };
        let finer = &separators[index + 1..];

        let mut chunks = Vec::new();
        let mut small: Vec<&str> = Vec::new();

        for piece in separator.split(text) {
            if char_len(piece) < self.chunk_size {
                small.push(piece);
                continue;
            }
            if !small.is_empty() {
                chunks.extend(self.merge(&small));
                small.clear();
            }
            if finer.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_recursive(piece, finer));
            }
        }

        if !small.is_empty() {
            chunks.extend(self.merge(&small));
        }
        chunks
    }

    /// Greedily merge pieces into chunks, carrying an overlapping tail.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !current.is_empty() {
                if let Some(doc) = join(&current) {
                    docs.push(doc);
                }
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match current.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }

            current.push_back(piece);
            total += len;
        }

        if let Some(doc) = join(&current) {
            docs.push(doc);
        }
        docs
    }
}

impl Splitter for MarkdownSplitter {
    fn split(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .collect()
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn join(pieces: &VecDeque<&str>) -> Option<String> {
    let joined: String = pieces.iter().copied().collect();
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter(chunk_size: usize, chunk_overlap: usize) -> MarkdownSplitter {
        MarkdownSplitter::new(ChunkingConfig {
            chunk_size,
            chunk_overlap,
        })
        .unwrap()
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = splitter(100, 10).split("  # Title\n\nJust a line.\n");
        assert_eq!(chunks, vec!["# Title\n\nJust a line."]);
    }

    #[test]
    fn test_splits_at_headings() {
        let text = "# Intro\nSome intro text.\n## Usage\nRun the tool.";
        let chunks = splitter(30, 0).split(text);
        assert_eq!(chunks, vec!["# Intro\nSome intro text.", "## Usage\nRun the tool."]);
    }

    #[test]
    fn test_overlap_between_word_chunks() {
        let chunks = splitter(10, 5).split("aaaa bbbb cccc dddd");
        assert_eq!(chunks, vec!["aaaa bbbb", "bbbb cccc", "cccc dddd"]);
    }

    #[test]
    fn test_character_fallback() {
        let chunks = splitter(4, 0).split("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_chunks_respect_size_with_multibyte_text() {
        let text = "Grüße aus München. ".repeat(40);
        let chunks = splitter(50, 10).split(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50, "chunk too long: {:?}", chunk);
        }
    }

    #[test]
    fn test_whitespace_only_input() {
        assert!(splitter(10, 0).split(" \n\n \n").is_empty());
        assert!(splitter(10, 0).split("").is_empty());
    }

    #[test]
    fn test_invalid_config() {
        assert!(MarkdownSplitter::new(ChunkingConfig { chunk_size: 0, chunk_overlap: 0 }).is_err());
        assert!(MarkdownSplitter::new(ChunkingConfig { chunk_size: 10, chunk_overlap: 10 }).is_err());
    }
}
