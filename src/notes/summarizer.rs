//! Per-segment summarization.

use crate::chunking::Segment;
use crate::config::Prompts;
use crate::error::{LecternError, Result, Stage};
use crate::generation::TextGenerator;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Summarizes transcript segments into partial notes, one generation call each.
pub struct SegmentSummarizer {
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<Prompts>,
}

impl SegmentSummarizer {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: Arc<Prompts>) -> Self {
        Self { generator, prompts }
    }

    /// Summarize a single segment.
    ///
    /// The response is returned as-is. Failures are attributed to the
    /// segment's 1-based position.
    #[instrument(skip(self, segment, title), fields(segment = segment.number(), chars = segment.text.len()))]
    pub async fn summarize(&self, segment: &Segment, title: &str) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("text".to_string(), segment.text.clone());
        vars.insert("title".to_string(), title.to_string());
        let prompt = self.prompts.render_with_custom(&self.prompts.summary.template, &vars);

        let summary = self
            .generator
            .generate(&prompt)
            .await
            .map_err(|e| e.at(Stage::Summarize { segment: segment.number() }))?;

        debug!("Segment {} summarized ({} chars)", segment.number(), summary.len());
        Ok(summary)
    }

    /// Summarize every segment whose slot is still empty.
    ///
    /// `slots[i]` holds an already known summary for `segments[i]` (for example
    /// one restored from an interrupted run) or `None`. With `max_concurrent`
    /// of 1 segments are processed strictly in order and nothing after a
    /// failed segment is attempted. With more, up to `max_concurrent` calls run
    /// at once and each result is written to its own slot, so the returned
    /// order always matches segment order; the first failure drops all
    /// outstanding calls.
    ///
    /// `on_summary` is invoked for each newly generated summary as it completes.
    pub async fn summarize_all<F>(
        &self,
        segments: &[Segment],
        title: &str,
        mut slots: Vec<Option<String>>,
        max_concurrent: usize,
        mut on_summary: F,
    ) -> Result<Vec<String>>
    where
        F: FnMut(&Segment, &str),
    {
        if slots.len() != segments.len() {
            return Err(LecternError::InvalidInput(format!(
                "{} summary slots for {} segments",
                slots.len(),
                segments.len()
            )));
        }

        let pending: Vec<&Segment> = segments
            .iter()
            .filter(|s| slots[s.index].is_none())
            .collect();

        info!(
            "Summarizing {} of {} segments (max concurrent: {})",
            pending.len(),
            segments.len(),
            max_concurrent
        );

        if max_concurrent <= 1 {
            for segment in pending {
                let summary = self.summarize(segment, title).await?;
                on_summary(segment, &summary);
                slots[segment.index] = Some(summary);
            }
        } else {
            let mut results = stream::iter(pending)
                .map(|segment| async move { (segment, self.summarize(segment, title).await) })
                .buffer_unordered(max_concurrent);

            while let Some((segment, result)) = results.next().await {
                let summary = result?;
                on_summary(segment, &summary);
                slots[segment.index] = Some(summary);
            }
        }

        slots.into_iter().collect::<Option<Vec<_>>>().ok_or_else(|| {
            LecternError::InvalidInput("segment summary missing after summarization".to_string())
        })
    }
}
