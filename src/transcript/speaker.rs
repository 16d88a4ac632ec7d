//! Speaker tag matching and utterance extraction.

use super::segment::{SegmentAccumulator, CLOSE_MARKER};
use crate::error::{CueragError, Result};
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, instrument};

/// A speaker as written in caption voice tags, e.g. `<v Merklein, Kai>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerTag {
    pub first_name: String,
    pub last_name: String,
}

impl SpeakerTag {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// Build the case-insensitive matcher for `<tag>text</v>`.
    ///
    /// The body is lazy so it stops at the first `</v>` after the tag.
    /// Captions are assumed never to carry a literal `</v>` as spoken text.
    pub fn matcher(&self) -> Result<Regex> {
        let pattern = format!(
            "(?is){}(.*?){}",
            regex::escape(&self.to_string()),
            regex::escape(CLOSE_MARKER)
        );
        Regex::new(&pattern).map_err(|e| CueragError::InvalidInput(format!("Bad speaker tag: {}", e)))
    }
}

impl std::fmt::Display for SpeakerTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<v {}, {}>", self.last_name, self.first_name)
    }
}

/// Counters collected during one extraction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Physical lines read.
    pub lines: usize,
    /// Segments closed by a `</v>` marker.
    pub segments: usize,
    /// Segments attributed to the requested speaker.
    pub matched: usize,
    /// Whether an unterminated segment was left at end of input.
    pub unterminated_tail: bool,
}

/// Extracts everything one speaker said from a caption transcript.
#[derive(Debug, Clone)]
pub struct SpeakerExtractor {
    tag: SpeakerTag,
    matcher: Regex,
}

impl SpeakerExtractor {
    /// Create an extractor for the given speaker.
    pub fn new(first_name: &str, last_name: &str) -> Result<Self> {
        let tag = SpeakerTag::new(first_name, last_name);
        let matcher = tag.matcher()?;
        Ok(Self { tag, matcher })
    }

    /// The speaker this extractor looks for.
    pub fn tag(&self) -> &SpeakerTag {
        &self.tag
    }

    /// Return the utterance inside a closed segment, if it belongs to the speaker.
    pub fn match_segment(&self, segment: &str) -> Option<String> {
        self.matcher
            .captures(segment)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Extract utterances from a caption file.
    ///
    /// Fails with [`CueragError::FileAccess`] if the file cannot be opened or a
    /// read fails midway; no partial result is returned in that case.
    #[instrument(skip(self), fields(speaker = %self.tag))]
    pub fn extract(&self, path: &Path) -> Result<Vec<String>> {
        self.extract_with_stats(path).map(|(utterances, _)| utterances)
    }

    /// Like [`extract`](Self::extract), also returning pass counters.
    pub fn extract_with_stats(&self, path: &Path) -> Result<(Vec<String>, ExtractionStats)> {
        let file = File::open(path).map_err(|e| CueragError::file_access(path, e))?;
        let (utterances, stats) = self
            .extract_from_reader(BufReader::new(file))
            .map_err(|e| CueragError::file_access(path, e))?;

        info!(
            "Extracted {} utterances from {} segments in {:?}",
            stats.matched, stats.segments, path
        );
        Ok((utterances, stats))
    }

    /// Run the extraction over any buffered reader.
    ///
    /// Lines end at `\n`, `\r\n` or a lone `\r`, and keep their original
    /// terminators so a closing line is appended exactly as read. Text left
    /// after the last `</v>` is discarded.
    pub fn extract_from_reader<R: BufRead>(
        &self,
        mut reader: R,
    ) -> std::io::Result<(Vec<String>, ExtractionStats)> {
        let mut accumulator = SegmentAccumulator::new();
        let mut utterances = Vec::new();
        let mut stats = ExtractionStats::default();
        let mut line = String::new();

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }

            for physical in split_lone_cr(&line) {
                stats.lines += 1;

                if let Some(segment) = accumulator.push_line(physical) {
                    stats.segments += 1;
                    match self.match_segment(&segment) {
                        Some(utterance) => {
                            stats.matched += 1;
                            utterances.push(utterance);
                        }
                        None => debug!("Dropped segment not spoken by {}", self.tag),
                    }
                }
            }
        }

        if !accumulator.pending().trim().is_empty() {
            stats.unterminated_tail = true;
            debug!(
                "Discarding unterminated segment of {} bytes",
                accumulator.pending().len()
            );
        }

        Ok((utterances, stats))
    }
}

/// Split a `read_line` result further at each `\r` not followed by `\n`.
fn split_lone_cr(line: &str) -> Vec<&str> {
    let bytes = line.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\r' && bytes.get(i + 1) != Some(&b'\n') {
            parts.push(&line[start..=i]);
            start = i + 1;
        }
    }
    if start < line.len() {
        parts.push(&line[start..]);
    }
    parts
}

/// Extract all text spoken by `first_name last_name` from a caption file.
pub fn extract(path: &Path, first_name: &str, last_name: &str) -> Result<Vec<String>> {
    SpeakerExtractor::new(first_name, last_name)?.extract(path)
}
