//! Speaker-attributed dialogue extraction from caption transcripts.
//!
//! Meeting tools export captions where each cue carries an inline voice tag:
//!
//! ```text
//! 00:00:01.000 --> 00:00:04.000
//! <v Merklein, Kai>Welcome everyone, today we walk
//! through the architecture document.</v>
//! ```
//!
//! Only the voice-tagged text is of interest here. Cue timings, styling and
//! regions are not interpreted; lines are streamed, joined into segments that
//! end at a `</v>` marker, and each segment is matched against the requested
//! speaker's tag.

mod segment;
mod speaker;

pub use segment::{SegmentAccumulator, CLOSE_MARKER};
pub use speaker::{extract, ExtractionStats, SpeakerExtractor, SpeakerTag};

/// Join extracted utterances into a single text, one utterance per line.
///
/// Utterances are trimmed here since the extractor returns them raw.
pub fn join_utterances(utterances: &[String]) -> String {
    utterances
        .iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_utterances() {
        let utterances = vec![
            "Hello world".to_string(),
            "  second one ".to_string(),
            "   ".to_string(),
        ];
        assert_eq!(join_utterances(&utterances), "Hello world\nsecond one");
    }

    #[test]
    fn test_join_empty() {
        assert_eq!(join_utterances(&[]), "");
    }
}
