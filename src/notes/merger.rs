//! Merge pass over partial summaries.

use crate::config::Prompts;
use crate::error::{LecternError, Result, Stage};
use crate::generation::TextGenerator;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Separator placed between partial summaries in the merge prompt.
pub const PARTIAL_SEPARATOR: &str = "\n\n";

/// Combines ordered partial summaries into the final notes document.
pub struct SummaryMerger {
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<Prompts>,
}

impl SummaryMerger {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: Arc<Prompts>) -> Self {
        Self { generator, prompts }
    }

    /// Whether merging `count` partials needs a generation call.
    pub fn needs_merge_call(count: usize) -> bool {
        count > 1
    }

    /// Merge partial summaries, in the order given.
    ///
    /// A single partial is returned unchanged without calling the model.
    #[instrument(skip(self, partials, title), fields(partials = partials.len()))]
    pub async fn merge(&self, partials: &[String], title: &str) -> Result<String> {
        match partials {
            [] => Err(LecternError::EmptyTranscript.at(Stage::Merge)),
            [only] => Ok(only.clone()),
            _ => {
                info!("Merging {} partial summaries", partials.len());

                let mut vars = HashMap::new();
                vars.insert("summaries".to_string(), partials.join(PARTIAL_SEPARATOR));
                vars.insert("title".to_string(), title.to_string());
                let prompt = self.prompts.render_with_custom(&self.prompts.merge.template, &vars);

                self.generator
                    .generate(&prompt)
                    .await
                    .map_err(|e| e.at(Stage::Merge))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MergePrompts;
    use crate::generation::testing::ScriptedGenerator;

    fn test_prompts() -> Arc<Prompts> {
        Arc::new(Prompts {
            merge: MergePrompts {
                template: "MERGE {{title}}\n{{summaries}}".to_string(),
            },
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_single_partial_passes_through() {
        let generator = Arc::new(ScriptedGenerator::fixed("should not be used"));
        let merger = SummaryMerger::new(generator.clone(), test_prompts());

        let doc = merger.merge(&["Introduction\n\nBody".to_string()], "T").await.unwrap();

        assert_eq!(doc, "Introduction\n\nBody");
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_multiple_partials_are_joined_in_order() {
        let generator = Arc::new(ScriptedGenerator::fixed("merged notes"));
        let merger = SummaryMerger::new(generator.clone(), test_prompts());
        let partials = vec!["first".to_string(), "second".to_string(), "third".to_string()];

        let doc = merger.merge(&partials, "Graphs").await.unwrap();

        assert_eq!(doc, "merged notes");
        assert_eq!(generator.prompts(), vec!["MERGE Graphs\nfirst\n\nsecond\n\nthird"]);
    }

    #[tokio::test]
    async fn test_merge_failure_is_attributed() {
        let generator = Arc::new(ScriptedGenerator::new(|_| {
            Err(LecternError::Generation("timeout".to_string()))
        }));
        let merger = SummaryMerger::new(generator, test_prompts());

        let err = merger
            .merge(&["a".to_string(), "b".to_string()], "T")
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Merge));
        assert!(err.to_string().starts_with("combining summaries"));
    }

    #[tokio::test]
    async fn test_no_partials_is_an_error() {
        let merger = SummaryMerger::new(Arc::new(ScriptedGenerator::fixed("x")), test_prompts());
        assert!(merger.merge(&[], "T").await.is_err());
        assert!(!SummaryMerger::needs_merge_call(1));
        assert!(SummaryMerger::needs_merge_call(2));
    }
}
