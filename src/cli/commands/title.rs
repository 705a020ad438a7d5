//! Title command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::generation::OpenAIGenerator;
use crate::notes::{file_stem, TitleGenerator};
use crate::render::{output_path, OutputFormat};
use crate::transcript_source::{default_sources, detect_source};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Run the title command.
pub async fn run_title(input: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Generate, &settings, &[input.to_string()]) {
        Output::error(&format!("{}", e));
        Output::info("Run 'lectern doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let format: OutputFormat = settings.notes.format.parse()?;
    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;
    let generator = Arc::new(OpenAIGenerator::with_config(&settings.generation)?);
    let title_generator = TitleGenerator::new(generator, Arc::new(prompts), &settings.notes.default_title);

    let sources = default_sources(&settings.youtube);
    let source = detect_source(&sources, input)
        .ok_or_else(|| anyhow::anyhow!("Could not parse input: {}", input))?;

    let spinner = Output::spinner("Fetching transcript...");
    let transcript = source.fetch_transcript(input).await;
    spinner.finish_and_clear();
    let transcript = transcript?;
    if transcript.is_empty() {
        return Err(anyhow::anyhow!("Transcript for {} is empty", input));
    }

    let spinner = Output::spinner("Generating title...");
    let title = title_generator.generate_title(&transcript.text).await;
    spinner.finish_and_clear();
    let title = title?;

    println!("{}", title);
    Output::kv("File name", &file_name(&title, &transcript.id, format));

    Ok(())
}

/// File name the notes document for `title` would get.
fn file_name(title: &str, transcript_id: &str, format: OutputFormat) -> String {
    let path = output_path(&PathBuf::new(), &file_stem(title, transcript_id), format);
    path.to_string_lossy().to_string()
}
