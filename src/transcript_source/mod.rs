//! Transcript source abstraction for Lectern.
//!
//! Provides a trait-based interface for caption sources (YouTube, local caption
//! or text files). Sources yield timed caption entries; the notes pipeline only
//! uses their text, joined into a [`Transcript`].

mod captions;
mod local;
mod youtube;

pub use captions::{parse_json3, parse_timed_text, parse_timestamp};
pub use local::LocalSource;
pub use youtube::{VideoRef, YoutubeSource};

use crate::config::YoutubeSettings;
use crate::error::{LecternError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Type of transcript source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    YouTube,
    Local,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::YouTube => write!(f, "youtube"),
            SourceType::Local => write!(f, "local"),
        }
    }
}

/// A single timed caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionEntry {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// Caption text.
    pub text: String,
}

impl CaptionEntry {
    pub fn new(start_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            text: text.into(),
        }
    }
}

/// Full transcript text for one source. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Stable identifier of the source (video ID or file stem).
    pub id: String,
    /// Where the transcript came from (URL or path).
    pub locator: String,
    /// Caption texts joined by single spaces.
    pub text: String,
    /// Number of caption entries the text was built from.
    pub entry_count: usize,
    /// Start of the last caption, in seconds.
    pub last_caption_seconds: f64,
}

impl Transcript {
    /// Build a transcript from caption entries, discarding timing.
    pub fn from_captions(id: impl Into<String>, locator: impl Into<String>, entries: &[CaptionEntry]) -> Self {
        let text = entries
            .iter()
            .map(|e| e.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            id: id.into(),
            locator: locator.into(),
            text,
            entry_count: entries.len(),
            last_caption_seconds: entries.last().map(|e| e.start_seconds).unwrap_or(0.0),
        }
    }

    /// Whether the transcript holds any words.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Trait for transcript source providers.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Get the source type.
    fn source_type(&self) -> SourceType;

    /// Check if this source can handle the given input.
    fn can_handle(&self, input: &str) -> bool;

    /// Extract a stable ID from input (URL, path, etc.).
    fn extract_id(&self, input: &str) -> Option<String>;

    /// Fetch the timed caption entries for the input.
    async fn fetch_captions(&self, input: &str) -> Result<Vec<CaptionEntry>>;

    /// Fetch captions and join them into a transcript.
    async fn fetch_transcript(&self, input: &str) -> Result<Transcript> {
        let id = self
            .extract_id(input)
            .ok_or_else(|| LecternError::InvalidInput(format!("Could not parse input: {}", input)))?;
        let entries = self.fetch_captions(input).await?;
        Ok(Transcript::from_captions(id, input, &entries))
    }
}

/// The built-in sources, in detection order.
pub fn default_sources(youtube: &YoutubeSettings) -> Vec<Arc<dyn TranscriptSource>> {
    vec![
        Arc::new(YoutubeSource::with_settings(youtube)),
        Arc::new(LocalSource::new()),
    ]
}

/// Detect the appropriate transcript source for the given input.
pub fn detect_source<'a>(
    sources: &'a [Arc<dyn TranscriptSource>],
    input: &str,
) -> Option<&'a Arc<dyn TranscriptSource>> {
    sources.iter().find(|s| s.can_handle(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_captions_joins_with_spaces() {
        let entries = vec![
            CaptionEntry::new(0.0, "welcome to"),
            CaptionEntry::new(1.5, "lecture three"),
            CaptionEntry::new(4.0, "on graphs"),
        ];

        let transcript = Transcript::from_captions("abc", "https://youtu.be/abc", &entries);

        assert_eq!(transcript.text, "welcome to lecture three on graphs");
        assert_eq!(transcript.entry_count, 3);
        assert_eq!(transcript.last_caption_seconds, 4.0);
        assert!(!transcript.is_empty());
    }

    #[test]
    fn test_empty_captions() {
        let transcript = Transcript::from_captions("abc", "abc", &[]);
        assert!(transcript.is_empty());
        assert_eq!(transcript.char_len(), 0);
    }

    #[test]
    fn test_detect_source() {
        let sources = default_sources(&YoutubeSettings::default());

        let youtube = detect_source(&sources, "https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(youtube.source_type(), SourceType::YouTube);

        assert!(detect_source(&sources, "/definitely/not/here.mp4").is_none());
    }
}
