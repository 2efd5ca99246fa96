//! Text chunking module
//!
//! Splits text into overlapping chunks that prefer to end on sentence
//! boundaries, with positional metadata for each chunk.

use ragkit_common::{RagError, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Configuration for text chunking
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub target_size: usize,
    /// Overlap between adjacent chunks in characters
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_size: 500,
            overlap: 50,
        }
    }
}

impl ChunkingConfig {
    pub fn new(target_size: usize, overlap: usize) -> Self {
        Self {
            target_size,
            overlap,
        }
    }

    /// Overlap must be strictly smaller than the target size; an overlap
    /// that large can never advance the scan window.
    pub fn validate(&self) -> Result<()> {
        if self.target_size == 0 {
            return Err(RagError::configuration("chunk target_size must be greater than zero"));
        }
        if self.overlap >= self.target_size {
            return Err(RagError::configuration(format!(
                "chunk overlap ({}) must be smaller than target_size ({})",
                self.overlap, self.target_size
            )));
        }
        Ok(())
    }
}

/// A text chunk with positional metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// The chunk content, trimmed of surrounding whitespace
    pub text: String,
    /// Index of this chunk in emission order
    pub chunk_index: usize,
    /// Start character position in the original text
    pub start_char: usize,
    /// End character position in the original text (exclusive)
    pub end_char: usize,
    /// Metadata inherited from the source document
    pub metadata: BTreeMap<String, String>,
}

/// Split text into overlapping chunks.
///
/// Positions are character offsets, not byte offsets, so multi-byte input
/// never splits inside a code point. Whitespace-only windows are dropped,
/// which means adversarial all-whitespace input yields zero chunks; callers
/// ingesting documents should surface that outcome rather than assume
/// success.
pub fn chunk_text(
    text: &str,
    config: &ChunkingConfig,
    base_metadata: &BTreeMap<String, String>,
) -> Result<Vec<Chunk>> {
    config.validate()?;

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < total {
        let mut end = (start + config.target_size).min(total);

        // Prefer to cut after a sentence boundary, but only when there is
        // more text to scan; the final window always runs to the end.
        if end < total {
            if let Some(boundary) = rightmost_boundary(&chars, start, end) {
                end = boundary + 1;
            }
        }

        let piece: String = chars[start..end].iter().collect();
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            chunks.push(Chunk {
                text: trimmed.to_string(),
                chunk_index: chunks.len(),
                start_char: start,
                end_char: end,
                metadata: base_metadata.clone(),
            });
        }

        if end >= total {
            break;
        }

        // A boundary cut can pull `end` back to within `overlap` of `start`;
        // force progress so the scan terminates.
        let next = end.saturating_sub(config.overlap);
        start = if next > start { next } else { start + 1 };
    }

    debug!(
        input_chars = total,
        chunk_count = chunks.len(),
        target_size = config.target_size,
        overlap = config.overlap,
        "Text chunked"
    );

    Ok(chunks)
}

/// Rightmost sentence boundary in `(start, end)`, as an absolute character
/// position. Markers are ". ", "! ", "? " (position of the punctuation) and
/// "\n"; the trailing space of a two-character marker must fall inside the
/// window, matching a backward substring search over `[start, end)`.
fn rightmost_boundary(chars: &[char], start: usize, end: usize) -> Option<usize> {
    let mut best = None;
    for i in start..end {
        let hit = match chars[i] {
            '\n' => true,
            '.' | '!' | '?' => i + 1 < end && chars[i + 1] == ' ',
            _ => false,
        };
        if hit && i > start {
            best = Some(i);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, target_size: usize, overlap: usize) -> Vec<Chunk> {
        chunk_text(text, &ChunkingConfig::new(target_size, overlap), &BTreeMap::new()).unwrap()
    }

    #[test]
    fn test_single_chunk_for_short_text() {
        let chunks = chunk("short text", 100, 20);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "short text");
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].start_char, 0);
        assert_eq!(chunks[0].end_char, 10);
    }

    #[test]
    fn test_exact_cuts_without_boundaries() {
        let text = "A".repeat(100);
        let chunks = chunk(&text, 20, 0);
        assert_eq!(chunks.len(), 5);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.text.len(), 20);
            assert_eq!(c.start_char, i * 20);
            assert_eq!(c.end_char, (i + 1) * 20);
        }
    }

    #[test]
    fn test_prefers_sentence_boundaries() {
        let text = "First sentence. Second sentence.";
        let chunks = chunk(text, 20, 0);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "First sentence.");
        assert_eq!(chunks[1].text, "Second sentence.");
    }

    #[test]
    fn test_newline_is_a_boundary() {
        let text = "heading\nbody text that keeps going for a while";
        let chunks = chunk(text, 20, 0);
        assert_eq!(chunks[0].text, "heading");
        assert_eq!(chunks[0].end_char, 8);
    }

    #[test]
    fn test_empty_and_whitespace_only_text() {
        assert!(chunk("", 50, 10).is_empty());
        assert!(chunk("   \n\t  ", 50, 10).is_empty());
    }

    #[test]
    fn test_coverage_has_no_gaps() {
        let text = "Lorem ipsum dolor sit amet. Consectetur adipiscing elit. \
                    Sed do eiusmod tempor incididunt ut labore. Et dolore magna aliqua. \
                    Ut enim ad minim veniam, quis nostrud exercitation.";
        let total = text.chars().count();
        let chunks = chunk(text, 40, 10);
        assert!(!chunks.is_empty());

        assert_eq!(chunks[0].start_char, 0);
        assert_eq!(chunks.last().unwrap().end_char, total);
        for pair in chunks.windows(2) {
            // Adjacent chunks may overlap but must not leave a hole.
            assert!(pair[1].start_char <= pair[0].end_char);
            assert!(pair[1].start_char > pair[0].start_char);
        }
    }

    #[test]
    fn test_chunk_count_bound() {
        let text = "B".repeat(100);
        // stride = target_size - overlap = 15
        let chunks = chunk(&text, 20, 5);
        let expected = 100usize.div_ceil(15);
        assert!(chunks.len().abs_diff(expected) <= 1);
    }

    #[test]
    fn test_overlap_reuses_tail_of_previous_chunk() {
        let text = "C".repeat(60);
        let chunks = chunk(&text, 20, 5);
        assert_eq!(chunks[1].start_char, 15);
        assert_eq!(chunks[0].end_char, 20);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_target() {
        let err = chunk_text("text", &ChunkingConfig::new(10, 10), &BTreeMap::new()).unwrap_err();
        assert_eq!(err.kind(), ragkit_common::ErrorKind::Configuration);

        let err = chunk_text("text", &ChunkingConfig::new(10, 25), &BTreeMap::new()).unwrap_err();
        assert_eq!(err.kind(), ragkit_common::ErrorKind::Configuration);
    }

    #[test]
    fn test_zero_target_size_rejected() {
        assert!(chunk_text("text", &ChunkingConfig::new(0, 0), &BTreeMap::new()).is_err());
    }

    #[test]
    fn test_terminates_when_boundary_cut_outpaces_overlap() {
        // "ab. " then filler: the boundary cut pulls `end` back so far that
        // `end - overlap` would not advance the cursor.
        let text = format!("ab. {}", "d".repeat(30));
        let chunks = chunk(&text, 10, 8);
        assert!(!chunks.is_empty());
        assert_eq!(chunks[0].text, "ab.");
        // Every start strictly increases, so the scan finished.
        for pair in chunks.windows(2) {
            assert!(pair[1].start_char > pair[0].start_char);
        }
    }

    #[test]
    fn test_multibyte_text_counts_characters() {
        let text = "héllo wörld ünïcode".repeat(5);
        let chunks = chunk(&text, 25, 5);
        assert!(!chunks.is_empty());
        let total = text.chars().count();
        assert_eq!(chunks.last().unwrap().end_char, total);
    }

    #[test]
    fn test_base_metadata_is_attached() {
        let mut metadata = BTreeMap::new();
        metadata.insert("filename".to_string(), "notes.txt".to_string());
        let chunks = chunk_text(
            "Some text here.",
            &ChunkingConfig::default(),
            &metadata,
        )
        .unwrap();
        assert_eq!(chunks[0].metadata.get("filename").map(String::as_str), Some("notes.txt"));
    }
}
