//! Title generation and filename sanitization.

use crate::config::Prompts;
use crate::error::{Result, Stage};
use crate::generation::TextGenerator;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Marker the title prompt asks the model to put in front of the title.
pub const TITLE_MARKER: &str = "Title: ";

/// Longest title kept, in words.
pub const MAX_TITLE_WORDS: usize = 10;

/// Derives a short descriptive title from a full transcript.
pub struct TitleGenerator {
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<Prompts>,
    default_title: String,
}

impl TitleGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: Arc<Prompts>, default_title: &str) -> Self {
        Self {
            generator,
            prompts,
            default_title: default_title.to_string(),
        }
    }

    /// Generate a title for the transcript with one generation call.
    #[instrument(skip_all, fields(transcript_chars = transcript.len()))]
    pub async fn generate_title(&self, transcript: &str) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), transcript.to_string());
        let prompt = self.prompts.render_with_custom(&self.prompts.title.template, &vars);

        let response = self
            .generator
            .generate(&prompt)
            .await
            .map_err(|e| e.at(Stage::Title))?;

        let title = extract_title(&response, &self.default_title);
        debug!("Generated title: {}", title);
        Ok(title)
    }
}

/// Pull the title out of a generation response.
///
/// Takes the text after the last `Title: ` marker, trimmed of whitespace. Only
/// emphasis or quotes that wrap the whole value (or the whole `Title: ...`
/// line) are removed there, so titles such as "Intro to C#" keep their
/// characters. Without a marker, the first non-empty line is used with any
/// surrounding `*`, `"`, `` ` `` and `#` dropped. If nothing usable remains,
/// `default_title` is returned. The result is cut to [`MAX_TITLE_WORDS`] words.
pub fn extract_title(response: &str, default_title: &str) -> String {
    let cleaned = match response.rfind(TITLE_MARKER) {
        Some(pos) => {
            let value = response[pos + TITLE_MARKER.len()..].trim();
            let value = strip_marker_wrapper(&response[..pos], value);
            strip_wrapper(value)
        }
        None => {
            warn!("Title response has no '{}' marker, using first line", TITLE_MARKER.trim());
            response
                .lines()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("")
                .trim()
                .trim_matches(|c: char| matches!(c, '*' | '"' | '`' | '#'))
                .trim()
        }
    };

    if cleaned.is_empty() {
        return default_title.to_string();
    }

    let words: Vec<&str> = cleaned.split_whitespace().collect();
    if words.len() > MAX_TITLE_WORDS {
        words[..MAX_TITLE_WORDS].join(" ")
    } else {
        cleaned.to_string()
    }
}

const WRAPPERS: &[&str] = &["**", "*", "`", "\""];

/// Drop the closing half of emphasis opened before the marker, as in `**Title: X**`.
fn strip_marker_wrapper<'a>(before_marker: &str, value: &'a str) -> &'a str {
    let before = before_marker.trim_end();
    WRAPPERS
        .iter()
        .find(|w| before.ends_with(**w))
        .and_then(|w| value.strip_suffix(*w))
        .map(str::trim_end)
        .unwrap_or(value)
}

/// Drop one pair of emphasis or quotes wrapping the whole value.
fn strip_wrapper(value: &str) -> &str {
    WRAPPERS
        .iter()
        .find_map(|w| value.strip_prefix(*w).and_then(|v| v.strip_suffix(*w)))
        .map(str::trim)
        .unwrap_or(value)
}

/// Restrict a title to letters, digits, spaces and underscores for use as a file stem.
///
/// Trailing whitespace is trimmed; interior spacing is preserved.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '_')
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// File stem for a title: the sanitized title, or `fallback` when nothing of it survives.
pub fn file_stem(title: &str, fallback: &str) -> String {
    match sanitize_title(title) {
        stem if stem.trim().is_empty() => fallback.to_string(),
        stem => stem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LecternError;
    use crate::generation::testing::ScriptedGenerator;

    #[test]
    fn test_extract_after_marker() {
        assert_eq!(
            extract_title("Some preamble. Title: Intro to Linear Algebra", "Video Summary"),
            "Intro to Linear Algebra"
        );
        assert_eq!(
            extract_title("Title: Draft\nTitle:  Final Answer  \n", "Video Summary"),
            "Final Answer"
        );
    }

    #[test]
    fn test_extract_strips_emphasis() {
        assert_eq!(extract_title("**Title: Dynamic Programming**", "x"), "Dynamic Programming");
    }

    #[test]
    fn test_extract_keeps_symbols_in_title() {
        assert_eq!(extract_title("Title: Intro to C#", "Video Summary"), "Intro to C#");
        assert_eq!(extract_title("Title: **F# for Beginners**", "x"), "F# for Beginners");
        assert_eq!(extract_title("Title: \"Pointers\" in C*", "x"), "\"Pointers\" in C*");
    }

    #[test]
    fn test_missing_marker_falls_back_to_first_line() {
        assert_eq!(
            extract_title("\n\"Graph Algorithms Explained\"\nMore text", "Video Summary"),
            "Graph Algorithms Explained"
        );
    }

    #[test]
    fn test_empty_response_uses_default() {
        assert_eq!(extract_title("   \n", "Video Summary"), "Video Summary");
        assert_eq!(extract_title("Title:   ", "Video Summary"), "Video Summary");
    }

    #[test]
    fn test_long_title_is_cut_to_ten_words() {
        let title = extract_title("Title: one two three four five six seven eight nine ten eleven", "x");
        assert_eq!(title, "one two three four five six seven eight nine ten");
    }

    #[test]
    fn test_file_stem_falls_back_when_empty() {
        assert_eq!(file_stem("Intro to C#", "lecture"), "Intro to C");
        assert_eq!(file_stem("???", "lecture"), "lecture");
    }

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("Week 3: Graphs & Trees!"), "Week 3 Graphs  Trees");
        assert_eq!(sanitize_title("snake_case title?  "), "snake_case title");
        assert_eq!(sanitize_title("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_title("!!!"), "");
    }

    #[tokio::test]
    async fn test_generate_title_embeds_transcript() {
        let generator = Arc::new(ScriptedGenerator::fixed("Title: Intro to Linear Algebra"));
        let titles = TitleGenerator::new(generator.clone(), Arc::new(Prompts::default()), "Video Summary");

        let title = titles.generate_title("vectors and matrices").await.unwrap();

        assert_eq!(title, "Intro to Linear Algebra");
        assert_eq!(generator.calls(), 1);
        assert!(generator.prompts()[0].contains("vectors and matrices"));
    }

    #[tokio::test]
    async fn test_generation_failure_is_attributed_to_title_stage() {
        let generator = Arc::new(ScriptedGenerator::new(|_| {
            Err(LecternError::Generation("quota exceeded".to_string()))
        }));
        let titles = TitleGenerator::new(generator, Arc::new(Prompts::default()), "Video Summary");

        let err = titles.generate_title("text").await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Title));
    }
}
