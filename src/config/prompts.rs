//! Prompt templates for Lectern.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory
//! (`summary.toml`, `merge.toml`, `title.toml`, each with a `template` key).

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    /// Per-segment note taking. Placeholders: `{{text}}`, `{{title}}`.
    pub summary: SummaryPrompts,
    /// Merge pass over partial summaries. Placeholders: `{{summaries}}`, `{{title}}`.
    pub merge: MergePrompts,
    /// Title generation. Placeholder: `{{transcript}}`.
    pub title: TitlePrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompt for summarizing one transcript segment into study notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    pub template: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            template: r#"Create detailed, engaging and comprehensive notes summarizing the content of the video transcript below, formatted for a college Learning Management System (LMS). The notes should be thorough, well organized and help students understand and review the material, even for a video that runs several hours.

Thorough coverage:
- Include every key point, concept, subtopic, example, definition, formula, diagram (described in text), case study, anecdote and practical application from the transcript.
- Omit nothing. Long lectures deserve extensive notes that may span many pages.

Structure:
- Introduction (3-4 sentences): the main topic, purpose and scope, how it connects to the course, and a quick overview of the structure.
- Key Sections: numbered sections following the video's major topics or chapters. Within each, use bullet points or subheadings for subtopics, concepts and examples, explaining each clearly with its examples, definitions, formulas, described diagrams and real-world applications.
- Conclusion (3-4 sentences): the main takeaways, why they matter to the course, and how they connect to future topics.

Tone:
- Professional yet approachable, natural for college students. No slang, no stiff formality.
- No filler, personal opinions or off-topic details. Avoid phrases like "In this video", "The presenter explains" or "As stated".

Length and layout:
- Long enough to cover everything (10+ pages for an 11-hour lecture).
- Clear section breaks, headings and subheadings; separate paragraphs with blank lines.

Transcript:

{{text}}

Output format:
Video Notes: {{title}}
Introduction
[Introduction to the topic, purpose, scope, and structure]

Key Sections
1. [Major Topic 1]
   - [Subtopic or Concept]: [Detailed explanation with examples, definitions, formulas, or applications]
   - [Subtopic or Example]: [Detailed explanation with specifics]
   ...
2. [Major Topic 2]
   ...

Conclusion
[Summary of key takeaways, relevance to the course, and future learning connections]"#
                .to_string(),
        }
    }
}

/// Prompt for merging partial summaries into one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergePrompts {
    pub template: String,
}

impl Default for MergePrompts {
    fn default() -> Self {
        Self {
            template: r#"Combine the following partial summaries into a single, cohesive set of notes, keeping the required structure (Video Notes, Introduction, Key Sections, Conclusion). Integrate all sections logically, keep the order of topics, avoid repetition and produce one unified document suitable for a multi-page PDF.

Partial summaries:

{{summaries}}

Output format:
# Video Notes: {{title}}
## Introduction
[Unified introduction]

## Key Sections
1. [Major Topic 1]
   - [Subtopic or Concept]: [Detailed explanation]
   ...

## Conclusion
[Unified conclusion]"#
                .to_string(),
        }
    }
}

/// Prompt for generating a short descriptive title.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TitlePrompts {
    pub template: String,
}

impl Default for TitlePrompts {
    fn default() -> Self {
        Self {
            template: r#"Generate a concise and descriptive title for a video based on the following transcript content. The title should be no more than 10 words and should capture the main topic or theme of the video.

Transcript:
{{transcript}}

Output format:
Title: [Generated Title]"#
                .to_string(),
        }
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("valid placeholder regex"))
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }

            let merge_path = custom_path.join("merge.toml");
            if merge_path.exists() {
                let content = std::fs::read_to_string(&merge_path)?;
                prompts.merge = toml::from_str(&content)?;
            }

            let title_path = custom_path.join("title.toml");
            if title_path.exists() {
                let content = std::fs::read_to_string(&title_path)?;
                prompts.title = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is single-pass: text inserted for one placeholder is never
    /// scanned for further placeholders, so transcript content containing
    /// `{{...}}` passes through untouched. Unknown placeholders are left as-is.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        placeholder_regex()
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts_carry_placeholders() {
        let prompts = Prompts::default();
        assert!(prompts.summary.template.contains("{{text}}"));
        assert!(prompts.summary.template.contains("{{title}}"));
        assert!(prompts.merge.template.contains("{{summaries}}"));
        assert!(prompts.title.template.contains("{{transcript}}"));
        assert!(prompts.title.template.contains("Title: "));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_does_not_rescan_inserted_text() {
        let mut vars = HashMap::new();
        vars.insert("text".to_string(), "literal {{title}} in speech".to_string());
        vars.insert("title".to_string(), "Graphs".to_string());

        let result = Prompts::render("{{title}}: {{text}}", &vars);
        assert_eq!(result, "Graphs: literal {{title}} in speech");
    }

    #[test]
    fn test_unknown_placeholder_left_alone() {
        let result = Prompts::render("keep {{missing}}", &HashMap::new());
        assert_eq!(result, "keep {{missing}}");
    }

    #[test]
    fn test_custom_variables_are_overridden_by_call_variables() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("course".to_string(), "CS101".to_string());
        prompts.variables.insert("title".to_string(), "config title".to_string());

        let mut vars = HashMap::new();
        vars.insert("title".to_string(), "call title".to_string());

        let result = prompts.render_with_custom("{{course}} / {{title}}", &vars);
        assert_eq!(result, "CS101 / call title");
    }

    #[test]
    fn test_load_custom_merge_prompt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("merge.toml"),
            "template = \"Merge for {{title}}:\\n{{summaries}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.merge.template, "Merge for {{title}}:\n{{summaries}}");
        assert_eq!(prompts.summary.template, SummaryPrompts::default().template);
    }
}
