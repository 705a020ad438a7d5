//! Notes command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::render::OutputFormat;
use crate::transcript_source::YoutubeSource;
use anyhow::Result;
use tracing::error;

/// Options of the notes command.
#[derive(Debug, Default)]
pub struct NotesOptions {
    pub inputs: Vec<String>,
    pub list: Option<String>,
    pub playlist: bool,
    pub limit: Option<usize>,
    pub output: Option<String>,
    pub format: Option<String>,
    pub fresh: bool,
}

/// Run the notes command.
pub async fn run_notes(options: NotesOptions, mut settings: Settings) -> Result<()> {
    if let Some(dir) = &options.output {
        settings.general.output_dir = dir.clone();
    }
    if let Some(format) = &options.format {
        let format: OutputFormat = format.parse()?;
        settings.notes.format = format.extension().to_string();
    }

    let mut inputs = options.inputs.clone();
    if let Some(list) = &options.list {
        let content = std::fs::read_to_string(list)
            .map_err(|e| anyhow::anyhow!("Failed to read worklist {}: {}", list, e))?;
        inputs.extend(parse_worklist(&content));
    }

    if inputs.is_empty() {
        Output::error("No inputs given. Pass transcript locators or --list FILE.");
        return Err(anyhow::anyhow!("no inputs"));
    }

    if !options.playlist {
        for input in inputs.iter().filter(|i| YoutubeSource::is_collection(i)) {
            Output::warning(&format!(
                "{} looks like a playlist or channel; pass --playlist to expand it",
                input
            ));
        }
    }

    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Generate, &settings, &inputs) {
        Output::error(&format!("{}", e));
        Output::info("Run 'lectern doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if options.playlist {
        inputs = expand_playlists(inputs, options.limit, &settings).await?;
        if inputs.is_empty() {
            Output::warning("No videos found");
            return Ok(());
        }
    }

    let orchestrator = Orchestrator::new(settings)?;
    let outcome = process_worklist(&orchestrator, &inputs, options.fresh).await;

    if outcome.total() > 1 {
        println!();
        Output::info(&format!(
            "Done: {} succeeded, {} failed",
            outcome.succeeded, outcome.failed
        ));
    }

    if outcome.failed > 0 {
        return Err(anyhow::anyhow!(
            "{} of {} transcripts failed",
            outcome.failed,
            outcome.total()
        ));
    }

    Ok(())
}

/// Counts of a worklist run.
#[derive(Debug, Default, PartialEq, Eq)]
struct WorklistOutcome {
    succeeded: usize,
    failed: usize,
}

impl WorklistOutcome {
    fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Process each locator in turn. A failed transcript is reported and the
/// remaining ones are still attempted.
async fn process_worklist(orchestrator: &Orchestrator, inputs: &[String], fresh: bool) -> WorklistOutcome {
    let total = inputs.len();
    let mut outcome = WorklistOutcome::default();

    for (i, locator) in inputs.iter().enumerate() {
        if total > 1 {
            Output::info(&format!("[{}/{}] Processing: {}", i + 1, total, locator));
        } else {
            Output::info(&format!("Processing: {}", locator));
        }

        match orchestrator.process(locator, fresh).await {
            Ok(result) => {
                Output::success(&format!("Notes written for '{}'", result.title));
                Output::notes_result(&result);
                outcome.succeeded += 1;
            }
            Err(e) => {
                error!("Processing {} failed: {}", locator, e);
                Output::error(&format!("Error processing {}: {}", locator, e));
                outcome.failed += 1;
            }
        }
    }

    outcome
}

/// Parse a worklist file: one locator per line, blank lines and `#` comments ignored.
fn parse_worklist(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Replace playlist and channel URLs with the videos they contain.
async fn expand_playlists(
    inputs: Vec<String>,
    limit: Option<usize>,
    settings: &Settings,
) -> Result<Vec<String>> {
    let source = YoutubeSource::with_settings(&settings.youtube);
    let mut expanded = Vec::new();

    for input in inputs {
        if !YoutubeSource::is_collection(&input) {
            expanded.push(input);
            continue;
        }

        let spinner = Output::spinner(&format!("Fetching video list for {}...", input));
        let videos = source.list_videos(&input, limit).await;
        spinner.finish_and_clear();

        let videos = videos?;
        Output::info(&format!("Found {} videos in {}", videos.len(), input));
        expanded.extend(
            videos
                .into_iter()
                .map(|v| format!("https://www.youtube.com/watch?v={}", v.id)),
        );
    }

    Ok(expanded)
}
