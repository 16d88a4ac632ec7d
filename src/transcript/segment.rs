//! Line-to-segment accumulation.

/// Closing marker of a voice span.
pub const CLOSE_MARKER: &str = "</v>";

/// Joins physical caption lines into logical segments.
///
/// Lines are buffered until one contains [`CLOSE_MARKER`] anywhere in it.
/// That line is appended verbatim and the whole buffer is handed back as a
/// finished segment; the buffer then starts empty again. Every other line is
/// trimmed and followed by a single space so words stay separated across
/// line breaks.
#[derive(Debug, Default)]
pub struct SegmentAccumulator {
    buffer: String,
}

impl SegmentAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one physical line. Returns the completed segment when the line
    /// closes it.
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        if line.contains(CLOSE_MARKER) {
            self.buffer.push_str(line);
            Some(std::mem::take(&mut self.buffer))
        } else {
            self.buffer.push_str(line.trim());
            self.buffer.push(' ');
            None
        }
    }

    /// Text buffered since the last closed segment.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Whether nothing has been buffered since the last closed segment.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_segment() {
        let mut acc = SegmentAccumulator::new();
        let seg = acc.push_line("<v Doe, Jane>Hi</v>\n");
        assert_eq!(seg.as_deref(), Some("<v Doe, Jane>Hi</v>\n"));
        assert!(acc.is_empty());
    }

    #[test]
    fn test_continuation_lines_are_trimmed_and_spaced() {
        let mut acc = SegmentAccumulator::new();
        assert!(acc.push_line("  <v Doe, Jane>Hello  \n").is_none());
        assert!(acc.push_line("\tbig\r\n").is_none());
        assert_eq!(acc.pending(), "<v Doe, Jane>Hello big ");

        let seg = acc.push_line("world</v>\n").unwrap();
        assert_eq!(seg, "<v Doe, Jane>Hello big world</v>\n");
        assert_eq!(acc.pending(), "");
    }

    #[test]
    fn test_close_marker_mid_line_terminates() {
        let mut acc = SegmentAccumulator::new();
        let seg = acc.push_line("<v Doe, Jane>a</v> trailing").unwrap();
        assert_eq!(seg, "<v Doe, Jane>a</v> trailing");
        assert!(acc.is_empty());
    }

    #[test]
    fn test_blank_lines_contribute_a_space() {
        let mut acc = SegmentAccumulator::new();
        acc.push_line("\n");
        acc.push_line("WEBVTT\n");
        assert_eq!(acc.pending(), " WEBVTT ");
    }
}
