//! Local transcript file source.
//!
//! Supports plain text transcripts and SRT/WebVTT caption files.

use super::captions::parse_timed_text;
use super::{CaptionEntry, SourceType, TranscriptSource};
use crate::error::{LecternError, Result};
use async_trait::async_trait;
use std::path::Path;

/// Plain text transcript extensions.
const TEXT_EXTENSIONS: &[&str] = &["txt"];

/// Timed caption file extensions.
const CAPTION_EXTENSIONS: &[&str] = &["srt", "vtt"];

/// Local file source for transcripts and caption files.
pub struct LocalSource;

impl LocalSource {
    pub fn new() -> Self {
        Self
    }

    fn extension(path: &Path) -> Option<String> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }

    /// Check if path is a plain text transcript.
    fn is_text_file(path: &Path) -> bool {
        Self::extension(path)
            .map(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    /// Check if path is a timed caption file.
    fn is_caption_file(path: &Path) -> bool {
        Self::extension(path)
            .map(|ext| CAPTION_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    fn is_transcript_file(path: &Path) -> bool {
        Self::is_text_file(path) || Self::is_caption_file(path)
    }
}

impl Default for LocalSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptSource for LocalSource {
    fn source_type(&self) -> SourceType {
        SourceType::Local
    }

    fn can_handle(&self, input: &str) -> bool {
        let path = Path::new(input);
        path.is_file() && Self::is_transcript_file(path)
    }

    fn extract_id(&self, input: &str) -> Option<String> {
        let path = Path::new(input);
        if !Self::is_transcript_file(path) {
            return None;
        }
        path.file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string())
    }

    async fn fetch_captions(&self, input: &str) -> Result<Vec<CaptionEntry>> {
        let path = Path::new(input);

        if !path.exists() {
            return Err(LecternError::Fetch(format!("File not found: {}", input)));
        }

        if !Self::is_transcript_file(path) {
            return Err(LecternError::InvalidInput(format!(
                "Not a recognized transcript or caption file: {}",
                input
            )));
        }

        let content = tokio::fs::read_to_string(path).await?;

        if Self::is_caption_file(path) {
            return Ok(parse_timed_text(&content));
        }

        let text = content.trim();
        if text.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(vec![CaptionEntry::new(0.0, text)])
        }
    }
}
