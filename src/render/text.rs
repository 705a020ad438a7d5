//! Markdown and plain text renderers.

use super::{DocumentRenderer, OutputFormat};
use crate::error::{LecternError, Result};
use std::path::Path;

fn write_document(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .map_err(|e| LecternError::Render(format!("Failed to write {}: {}", path.display(), e)))
}

/// Renders notes as a Markdown file with the title as top-level heading.
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub fn to_markdown(title: &str, paragraphs: &[String]) -> String {
        let mut out = format!("# {}\n", title);
        for paragraph in paragraphs {
            out.push('\n');
            out.push_str(paragraph);
            out.push('\n');
        }
        out
    }
}

impl DocumentRenderer for MarkdownRenderer {
    fn render(&self, title: &str, paragraphs: &[String], path: &Path) -> Result<()> {
        write_document(path, &Self::to_markdown(title, paragraphs))
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

/// Renders notes as plain text with an underlined title.
pub struct TextRenderer;

impl TextRenderer {
    pub fn to_text(title: &str, paragraphs: &[String]) -> String {
        let underline = "=".repeat(title.chars().count());
        let mut out = format!("{}\n{}\n", title, underline);
        for paragraph in paragraphs {
            out.push('\n');
            out.push_str(paragraph);
            out.push('\n');
        }
        out
    }
}

impl DocumentRenderer for TextRenderer {
    fn render(&self, title: &str, paragraphs: &[String], path: &Path) -> Result<()> {
        write_document(path, &Self::to_text(title, paragraphs))
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraphs() -> Vec<String> {
        vec!["## Key ideas\n- BFS\n- DFS".to_string(), "Done.".to_string()]
    }

    #[test]
    fn test_markdown_layout() {
        assert_eq!(
            MarkdownRenderer::to_markdown("Graphs", &paragraphs()),
            "# Graphs\n\n## Key ideas\n- BFS\n- DFS\n\nDone.\n"
        );
    }

    #[test]
    fn test_text_layout() {
        assert_eq!(
            TextRenderer::to_text("Graphs", &paragraphs()),
            "Graphs\n======\n\n## Key ideas\n- BFS\n- DFS\n\nDone.\n"
        );
    }

    #[test]
    fn test_render_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");

        MarkdownRenderer.render("Graphs", &paragraphs(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Graphs\n"));
    }

    #[test]
    fn test_render_into_missing_directory_fails() {
        let result = TextRenderer.render("T", &[], Path::new("/definitely/not/here/notes.txt"));
        assert!(matches!(result, Err(LecternError::Render(_))));
    }
}
