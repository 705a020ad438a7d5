//! Transcript chunking.
//!
//! Splits a transcript into bounded-size segments so each one fits in a single
//! generation request. The split is greedy and length-only: whitespace tokens
//! are accumulated until the running length reaches the limit, and no token is
//! ever split. Boundaries do not follow sentences or topics.

use serde::{Deserialize, Serialize};

/// Default maximum segment length in characters.
pub const DEFAULT_MAX_LENGTH: usize = 500_000;

/// A contiguous run of transcript tokens, the unit of independent summarization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Position of this segment in the transcript (0-based).
    pub index: usize,
    /// Tokens of this segment joined by single spaces.
    pub text: String,
}

impl Segment {
    pub fn new(index: usize, text: String) -> Self {
        Self { index, text }
    }

    /// 1-based position, as used in progress output and error messages.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Split `text` into segments of roughly `max_length` characters.
///
/// Each token contributes its length plus one separator. A segment is closed as
/// soon as its accumulated length reaches `max_length`, so a token longer than
/// the limit ends up alone in an oversized segment. Whatever remains at the end
/// of the input becomes the last segment regardless of size.
pub fn chunk_transcript(text: &str, max_length: usize) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_length = 0usize;

    for token in text.split_whitespace() {
        current.push(token);
        current_length += token.chars().count() + 1;

        if current_length >= max_length {
            segments.push(Segment::new(segments.len(), current.join(" ")));
            current.clear();
            current_length = 0;
        }
    }

    if !current.is_empty() {
        segments.push(Segment::new(segments.len(), current.join(" ")));
    }

    segments
}

/// Size statistics for a set of segments.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ChunkStats {
    pub segment_count: usize,
    pub total_chars: usize,
    pub min_chars: usize,
    pub max_chars: usize,
}

impl ChunkStats {
    pub fn from_segments(segments: &[Segment]) -> Self {
        let lengths: Vec<usize> = segments.iter().map(Segment::char_len).collect();

        Self {
            segment_count: segments.len(),
            total_chars: lengths.iter().sum(),
            min_chars: lengths.iter().copied().min().unwrap_or(0),
            max_chars: lengths.iter().copied().max().unwrap_or(0),
        }
    }

    /// Generation calls needed to produce notes: one per segment, plus a merge
    /// pass when there is more than one segment.
    pub fn generation_calls(&self) -> usize {
        match self.segment_count {
            0 => 0,
            1 => 1,
            n => n + 1,
        }
    }
}
