//! Document rendering for finished notes.
//!
//! The pipeline hands renderers a title and the body split into paragraphs.
//! Renderers decide layout only; paragraph text is written as given.

mod pdf;
mod text;

pub use pdf::PdfRenderer;
pub use text::{MarkdownRenderer, TextRenderer};

use crate::error::{LecternError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pdf,
    Markdown,
    Text,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Markdown => "md",
            OutputFormat::Text => "txt",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = LecternError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(OutputFormat::Pdf),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            "txt" | "text" => Ok(OutputFormat::Text),
            other => Err(LecternError::InvalidInput(format!(
                "Unknown output format '{}' (expected pdf, md or txt)",
                other
            ))),
        }
    }
}

/// Trait for document renderers.
pub trait DocumentRenderer: Send + Sync {
    /// Write a document with `title` as heading and `paragraphs` as body to `path`.
    fn render(&self, title: &str, paragraphs: &[String], path: &Path) -> Result<()>;

    /// Format produced by this renderer.
    fn format(&self) -> OutputFormat;
}

/// Create the renderer for an output format.
pub fn create_renderer(format: OutputFormat) -> Box<dyn DocumentRenderer> {
    match format {
        OutputFormat::Pdf => Box::new(PdfRenderer::new()),
        OutputFormat::Markdown => Box::new(MarkdownRenderer),
        OutputFormat::Text => Box::new(TextRenderer),
    }
}

/// Split a document body into paragraphs.
///
/// A paragraph is a run of non-blank lines. Lines inside a paragraph keep
/// their line breaks so lists stay lists; surrounding whitespace is trimmed
/// and empty paragraphs are dropped.
pub fn split_paragraphs(body: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in body.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n").trim().to_string());
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n").trim().to_string());
    }

    paragraphs.retain(|p| !p.is_empty());
    paragraphs
}

/// Final location of a rendered document: `{dir}/{stem}.{ext}`.
pub fn output_path(dir: &Path, stem: &str, format: OutputFormat) -> PathBuf {
    dir.join(format!("{}.{}", stem, format.extension()))
}
