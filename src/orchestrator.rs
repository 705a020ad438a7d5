//! Pipeline orchestrator for Lectern.
//!
//! Coordinates one transcript at a time through
//! fetch, title, chunk, summarize, merge and render. Each stage only starts
//! once the previous one succeeded, and every failure carries the stage it
//! happened in.

use crate::chunking::{chunk_transcript, ChunkStats, Segment};
use crate::config::{Prompts, Settings};
use crate::error::{LecternError, Result, Stage};
use crate::generation::{OpenAIGenerator, TextGenerator};
use crate::notes::{file_stem, SegmentSummarizer, SummaryMerger, TitleGenerator};
use crate::render::{create_renderer, output_path, split_paragraphs, DocumentRenderer, OutputFormat};
use crate::store::PartialStore;
use crate::transcript_source::{default_sources, detect_source, Transcript, TranscriptSource};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The main orchestrator for the notes pipeline.
pub struct Orchestrator {
    settings: Settings,
    sources: Vec<Arc<dyn TranscriptSource>>,
    title_generator: TitleGenerator,
    summarizer: SegmentSummarizer,
    merger: SummaryMerger,
    renderer: Box<dyn DocumentRenderer>,
    partials: Option<PartialStore>,
}

impl Orchestrator {
    /// Create a new orchestrator with default components.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let generator: Arc<dyn TextGenerator> = Arc::new(OpenAIGenerator::with_config(&settings.generation)?);
        info!("Using model {}", generator.model());

        let sources = default_sources(&settings.youtube);

        let partials = if settings.summarization.persist_partials {
            Some(PartialStore::new(&settings.partials_db_path())?)
        } else {
            None
        };

        Self::with_components(settings, prompts, generator, sources, partials)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        generator: Arc<dyn TextGenerator>,
        sources: Vec<Arc<dyn TranscriptSource>>,
        partials: Option<PartialStore>,
    ) -> Result<Self> {
        settings.validate()?;
        let format: OutputFormat = settings
            .notes
            .format
            .parse()
            .map_err(|e: LecternError| LecternError::Config(e.to_string()))?;

        let prompts = Arc::new(prompts);

        Ok(Self {
            title_generator: TitleGenerator::new(
                generator.clone(),
                prompts.clone(),
                &settings.notes.default_title,
            ),
            summarizer: SegmentSummarizer::new(generator.clone(), prompts.clone()),
            merger: SummaryMerger::new(generator, prompts),
            renderer: create_renderer(format),
            sources,
            partials,
            settings,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get the partial summary store, if persistence is enabled.
    pub fn partials(&self) -> Option<&PartialStore> {
        self.partials.as_ref()
    }

    /// Fetch the transcript for a locator.
    ///
    /// A transcript without any words is an error here, before any generation
    /// call is made.
    #[instrument(skip(self))]
    pub async fn fetch(&self, locator: &str) -> Result<Transcript> {
        let source = detect_source(&self.sources, locator).ok_or_else(|| {
            LecternError::InvalidInput(format!("Could not parse input: {}", locator)).at(Stage::Fetch)
        })?;

        let transcript = source
            .fetch_transcript(locator)
            .await
            .map_err(|e| e.at(Stage::Fetch))?;

        if transcript.is_empty() {
            return Err(LecternError::EmptyTranscript.at(Stage::Fetch));
        }

        info!(
            "Fetched transcript {} ({} entries, {} chars)",
            transcript.id,
            transcript.entry_count,
            transcript.char_len()
        );
        Ok(transcript)
    }

    /// Generate a title for the whole transcript.
    pub async fn generate_title(&self, transcript: &Transcript) -> Result<String> {
        self.title_generator.generate_title(&transcript.text).await
    }

    /// Title for this run: the one stored by an unfinished earlier run of the
    /// same transcript text, or a new one.
    ///
    /// Returns the title and whether a generation call was made.
    async fn resolve_title(&self, transcript: &Transcript, fresh: bool) -> Result<(String, bool)> {
        if let (Some(store), false) = (&self.partials, fresh) {
            match store.stored_title(transcript) {
                Ok(Some(title)) => {
                    info!("Reusing title from unfinished run: {}", title);
                    return Ok((title, false));
                }
                Ok(None) => {}
                Err(e) => warn!("Failed to read stored title: {}", e),
            }
        }

        let title = self.generate_title(transcript).await?;

        if let Some(store) = &self.partials {
            if let Err(e) = store.save_title(transcript, &title) {
                warn!("Failed to store title: {}", e);
            }
        }

        Ok((title, true))
    }

    /// Chunk, summarize and merge a transcript into one notes document.
    pub async fn summarize_transcript(&self, transcript: &Transcript, title: &str) -> Result<String> {
        let outcome = self.summarize_segments(transcript, title, false).await?;
        Ok(outcome.document)
    }

    async fn summarize_segments(
        &self,
        transcript: &Transcript,
        title: &str,
        fresh: bool,
    ) -> Result<SummaryOutcome> {
        let max_length = self.settings.chunking.max_length;
        let segments = chunk_transcript(&transcript.text, max_length);
        if segments.is_empty() {
            return Err(LecternError::EmptyTranscript.at(Stage::Chunk));
        }

        let stats = ChunkStats::from_segments(&segments);
        info!(
            "Split transcript into {} segments ({}..{} chars)",
            stats.segment_count, stats.min_chars, stats.max_chars
        );
        eprintln!("  Split into {} segments", stats.segment_count);

        let slots = self.restored_slots(transcript, &segments, fresh);
        let resumed_segments = slots.iter().filter(|s| s.is_some()).count();
        if resumed_segments > 0 {
            eprintln!("  Resuming with {} stored segment summaries", resumed_segments);
        }

        let pb = progress_bar((segments.len() - resumed_segments) as u64);
        let partials = self
            .summarizer
            .summarize_all(
                &segments,
                title,
                slots,
                self.settings.summarization.max_concurrent,
                |segment, summary| {
                    pb.inc(1);
                    self.store_partial(transcript, segment, max_length, summary);
                },
            )
            .await;
        pb.finish_and_clear();
        let partials = partials?;

        if SummaryMerger::needs_merge_call(partials.len()) {
            eprintln!("  Combining {} segment summaries...", partials.len());
        }
        let document = self.merger.merge(&partials, title).await?;

        Ok(SummaryOutcome {
            document,
            segment_count: segments.len(),
            summarized_segments: segments.len() - resumed_segments,
            resumed_segments,
        })
    }

    fn restored_slots(&self, transcript: &Transcript, segments: &[Segment], fresh: bool) -> Vec<Option<String>> {
        let empty = vec![None; segments.len()];
        let Some(store) = self.partials.as_ref().filter(|_| !fresh) else {
            return empty;
        };

        match store.load_partials(transcript, segments, self.settings.chunking.max_length) {
            Ok(slots) => slots,
            Err(e) => {
                warn!("Failed to load stored partial summaries: {}", e);
                empty
            }
        }
    }

    fn store_partial(&self, transcript: &Transcript, segment: &Segment, max_length: usize, summary: &str) {
        if let Some(store) = &self.partials {
            if let Err(e) = store.save_partial(transcript, segment, max_length, summary) {
                warn!("Failed to store partial summary {}: {}", segment.number(), e);
            }
        }
    }

    /// Run the full pipeline for one transcript and write the notes document.
    ///
    /// With `fresh`, anything stored by an earlier unfinished run of the same
    /// transcript is discarded first.
    #[instrument(skip(self), fields(locator = %locator))]
    pub async fn process(&self, locator: &str, fresh: bool) -> Result<NotesResult> {
        eprintln!("  Fetching transcript...");
        let transcript = self.fetch(locator).await?;
        eprintln!("  Transcript: {} characters", transcript.char_len());

        if fresh {
            if let Some(store) = &self.partials {
                if let Err(e) = store.clear(&transcript) {
                    warn!("Failed to clear stored partial summaries: {}", e);
                }
            }
        }

        eprintln!("  Generating title...");
        let (title, title_generated) = self.resolve_title(&transcript, fresh).await?;
        eprintln!("  Title: {}", title);

        let outcome = self.summarize_segments(&transcript, &title, fresh).await?;

        let stem = file_stem(&title, &transcript.id);
        let output_path = self
            .write_document(&title, &outcome.document, &stem)
            .map_err(|e| e.at(Stage::Render))?;
        eprintln!("  Wrote {}", output_path.display());

        if let Some(store) = &self.partials {
            if let Err(e) = store.clear(&transcript) {
                warn!("Failed to clear stored partial summaries: {}", e);
            }
        }

        let merge_calls = usize::from(SummaryMerger::needs_merge_call(outcome.segment_count));
        Ok(NotesResult {
            source_id: transcript.id,
            title,
            output_path,
            segment_count: outcome.segment_count,
            generation_calls: usize::from(title_generated) + outcome.summarized_segments + merge_calls,
            resumed_segments: outcome.resumed_segments,
        })
    }

    /// Render into a temporary file next to the destination, then move it into place.
    fn write_document(&self, title: &str, document: &str, stem: &str) -> Result<PathBuf> {
        let output_dir = self.settings.output_dir();
        std::fs::create_dir_all(&output_dir)?;

        let format = self.renderer.format();
        let final_path = output_path(&output_dir, stem, format);
        let paragraphs = split_paragraphs(document);

        let temp = tempfile::Builder::new()
            .prefix(".lectern-")
            .suffix(&format!(".{}", format.extension()))
            .tempfile_in(&output_dir)?;

        self.renderer.render(title, &paragraphs, temp.path())?;
        persist(temp, &final_path)?;

        info!("Rendered {} paragraphs to {:?}", paragraphs.len(), final_path);
        Ok(final_path)
    }
}

fn persist(temp: tempfile::NamedTempFile, path: &Path) -> Result<()> {
    temp.persist(path)
        .map(|_| ())
        .map_err(|e| LecternError::Render(format!("Failed to move notes into {}: {}", path.display(), e.error)))
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::default_bar().template("  {spinner:.green} Summarizing [{bar:30.cyan/blue}] {pos}/{len}")
    {
        pb.set_style(style.progress_chars("█▓░"));
    }
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

struct SummaryOutcome {
    document: String,
    segment_count: usize,
    summarized_segments: usize,
    resumed_segments: usize,
}

/// Result of producing notes for one transcript.
#[derive(Debug)]
pub struct NotesResult {
    /// Transcript source ID.
    pub source_id: String,
    /// Title used as document heading.
    pub title: String,
    /// Where the notes were written.
    pub output_path: PathBuf,
    /// Number of segments the transcript was split into.
    pub segment_count: usize,
    /// Generation calls made during this run.
    pub generation_calls: usize,
    /// Segments whose summary was restored from an earlier run.
    pub resumed_segments: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MergePrompts, SummaryPrompts, TitlePrompts};
    use crate::generation::testing::ScriptedGenerator;
    use crate::transcript_source::{CaptionEntry, SourceType};
    use async_trait::async_trait;

    struct FakeSource {
        text: String,
    }

    #[async_trait]
    impl TranscriptSource for FakeSource {
        fn source_type(&self) -> SourceType {
            SourceType::Local
        }

        fn can_handle(&self, input: &str) -> bool {
            input.starts_with("fake:")
        }

        fn extract_id(&self, input: &str) -> Option<String> {
            input.strip_prefix("fake:").map(|s| s.to_string())
        }

        async fn fetch_captions(&self, _input: &str) -> Result<Vec<CaptionEntry>> {
            Ok(vec![CaptionEntry::new(0.0, self.text.clone())])
        }
    }

    fn prompts() -> Prompts {
        Prompts {
            summary: SummaryPrompts { template: "SUMMARIZE {{text}}".to_string() },
            merge: MergePrompts { template: "MERGE {{summaries}}".to_string() },
            title: TitlePrompts { template: "TITLE {{transcript}}".to_string() },
            ..Default::default()
        }
    }

    /// Title responses carry a marker, summaries echo a short prefix, merges join.
    fn responder(prompt: &str) -> Result<String> {
        if prompt.starts_with("TITLE") {
            Ok("Title: Graph Theory Basics".to_string())
        } else if let Some(text) = prompt.strip_prefix("SUMMARIZE ") {
            Ok(format!("summary of {}", text.split_whitespace().next().unwrap_or("")))
        } else {
            Ok("## Introduction\nmerged notes".to_string())
        }
    }

    fn settings(output_dir: &Path, max_length: usize) -> Settings {
        let mut settings = Settings::default();
        settings.general.output_dir = output_dir.to_string_lossy().to_string();
        settings.chunking.max_length = max_length;
        settings.notes.format = "md".to_string();
        settings
    }

    fn orchestrator(
        settings: Settings,
        text: &str,
        generator: Arc<ScriptedGenerator>,
        partials: Option<PartialStore>,
    ) -> Orchestrator {
        let sources: Vec<Arc<dyn TranscriptSource>> = vec![Arc::new(FakeSource { text: text.to_string() })];
        Orchestrator::with_components(settings, prompts(), generator, sources, partials).unwrap()
    }

    fn words(count: usize) -> String {
        (0..count).map(|i| format!("w{:04}", i)).collect::<Vec<_>>().join(" ")
    }

    #[tokio::test]
    async fn test_multi_segment_run_makes_one_merge_call() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(ScriptedGenerator::new(responder));
        // 30 tokens of 6 chars each (5 + separator) with a limit of 60 -> 3 segments.
        let orch = orchestrator(settings(dir.path(), 60), &words(30), generator.clone(), None);

        let result = orch.process("fake:lecture-1", false).await.unwrap();

        assert_eq!(result.segment_count, 3);
        assert_eq!(result.generation_calls, 5);
        assert_eq!(generator.calls(), 5);
        assert_eq!(result.title, "Graph Theory Basics");
        assert_eq!(result.output_path, dir.path().join("Graph Theory Basics.md"));

        let prompts = generator.prompts();
        assert!(prompts[0].starts_with("TITLE"));
        assert_eq!(
            prompts[4],
            "MERGE summary of w0000\n\nsummary of w0010\n\nsummary of w0020"
        );

        let written = std::fs::read_to_string(&result.output_path).unwrap();
        assert_eq!(written, "# Graph Theory Basics\n\n## Introduction\nmerged notes\n");
    }

    #[tokio::test]
    async fn test_single_segment_run_skips_merge() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(ScriptedGenerator::new(responder));
        let orch = orchestrator(settings(dir.path(), 10_000), &words(30), generator.clone(), None);

        let result = orch.process("fake:lecture-1", false).await.unwrap();

        assert_eq!(result.segment_count, 1);
        assert_eq!(generator.calls(), 2);
        let written = std::fs::read_to_string(&result.output_path).unwrap();
        assert_eq!(written, "# Graph Theory Basics\n\nsummary of w0000\n");
    }

    #[tokio::test]
    async fn test_failed_segment_stops_run_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(ScriptedGenerator::new(|prompt: &str| {
            if prompt.contains("w0010") && prompt.starts_with("SUMMARIZE") {
                Err(LecternError::Generation("quota exceeded".to_string()))
            } else {
                responder(prompt)
            }
        }));
        let orch = orchestrator(settings(dir.path(), 60), &words(30), generator.clone(), None);

        let err = orch.process("fake:lecture-1", false).await.unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Summarize { segment: 2 }));
        // title + segment 1 + failed segment 2; segment 3 and the merge never run
        assert_eq!(generator.calls(), 3);
        assert!(generator.prompts().iter().all(|p| !p.starts_with("MERGE")));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_title_failure_is_attributed() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(ScriptedGenerator::new(|_: &str| {
            Err(LecternError::Generation("unauthorized".to_string()))
        }));
        let orch = orchestrator(settings(dir.path(), 60), &words(30), generator.clone(), None);

        let err = orch.process("fake:lecture-1", false).await.unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Title));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_transcript_fails_before_generation() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(ScriptedGenerator::new(responder));
        let orch = orchestrator(settings(dir.path(), 60), "   ", generator.clone(), None);

        let err = orch.process("fake:empty", false).await.unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Fetch));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_locator() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(ScriptedGenerator::new(responder));
        let orch = orchestrator(settings(dir.path(), 60), "text", generator, None);

        let err = orch.process("nowhere", false).await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Fetch));
    }

    #[tokio::test]
    async fn test_merge_failure_resumes_from_stored_partials() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("state").join("partials.db");
        let out = dir.path().join("notes");

        let failing = Arc::new(ScriptedGenerator::new(|prompt: &str| {
            if prompt.starts_with("MERGE") {
                Err(LecternError::Generation("timeout".to_string()))
            } else {
                responder(prompt)
            }
        }));
        let orch = orchestrator(
            settings(&out, 60),
            &words(30),
            failing.clone(),
            Some(PartialStore::new(&db).unwrap()),
        );
        let err = orch.process("fake:lecture-1", false).await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Merge));
        assert_eq!(failing.calls(), 5);
        drop(orch);

        let retry = Arc::new(ScriptedGenerator::new(responder));
        let orch = orchestrator(
            settings(&out, 60),
            &words(30),
            retry.clone(),
            Some(PartialStore::new(&db).unwrap()),
        );
        let result = orch.process("fake:lecture-1", false).await.unwrap();

        assert_eq!(result.resumed_segments, 3);
        assert_eq!(result.generation_calls, 1);
        assert_eq!(retry.calls(), 1);
        assert!(retry.prompts()[0].starts_with("MERGE"));
        assert!(orch.partials().unwrap().list_runs().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fresh_run_ignores_stored_partials() {
        let dir = tempfile::tempdir().unwrap();
        let store = PartialStore::in_memory().unwrap();
        let stored = Transcript::from_captions("lecture-1", "fake:lecture-1", &[CaptionEntry::new(0.0, words(30))]);
        store.save_title(&stored, "Stale Title").unwrap();

        let generator = Arc::new(ScriptedGenerator::new(responder));
        let orch = orchestrator(settings(dir.path(), 60), &words(30), generator.clone(), Some(store));

        let result = orch.process("fake:lecture-1", true).await.unwrap();

        assert_eq!(result.title, "Graph Theory Basics");
        assert_eq!(result.resumed_segments, 0);
        assert_eq!(generator.calls(), 5);
    }

    #[tokio::test]
    async fn test_concurrent_summaries_keep_segment_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path(), 60);
        settings.summarization.max_concurrent = 3;
        let generator = Arc::new(ScriptedGenerator::new(responder));
        let orch = orchestrator(settings, &words(30), generator.clone(), None);

        orch.process("fake:lecture-1", false).await.unwrap();

        let merge_prompt = generator
            .prompts()
            .into_iter()
            .find(|p| p.starts_with("MERGE"))
            .unwrap();
        assert_eq!(
            merge_prompt,
            "MERGE summary of w0000\n\nsummary of w0010\n\nsummary of w0020"
        );
    }

    #[tokio::test]
    async fn test_unusable_title_falls_back_to_source_id() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(ScriptedGenerator::new(|prompt: &str| {
            if prompt.starts_with("TITLE") {
                Ok("Title: ???".to_string())
            } else {
                responder(prompt)
            }
        }));
        let orch = orchestrator(settings(dir.path(), 10_000), &words(5), generator, None);

        let result = orch.process("fake:lecture-7", false).await.unwrap();

        assert_eq!(result.output_path, dir.path().join("lecture-7.md"));
    }

    #[test]
    fn test_invalid_format_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path(), 60);
        settings.notes.format = "docx".to_string();
        let generator = Arc::new(ScriptedGenerator::new(responder));

        let result = Orchestrator::with_components(settings, prompts(), generator, Vec::new(), None);
        assert!(matches!(result, Err(LecternError::Config(_))));
    }
}
