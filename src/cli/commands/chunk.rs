//! Chunk command - preview how a transcript is split, without generation calls.

use crate::chunking::{chunk_transcript, ChunkStats};
use crate::cli::output::format_duration;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::transcript_source::{default_sources, detect_source};
use anyhow::Result;

/// Run the chunk command.
pub async fn run_chunk(input: &str, max_length: Option<usize>, settings: Settings) -> Result<()> {
    let max_length = max_length.unwrap_or(settings.chunking.max_length);
    if max_length == 0 {
        return Err(anyhow::anyhow!("--max-length must be greater than zero"));
    }

    preflight::check(Operation::Fetch, &settings, &[input.to_string()])?;

    let sources = default_sources(&settings.youtube);
    let source = detect_source(&sources, input)
        .ok_or_else(|| anyhow::anyhow!("Could not parse input: {}", input))?;

    let spinner = Output::spinner("Fetching transcript...");
    let transcript = source.fetch_transcript(input).await;
    spinner.finish_and_clear();
    let transcript = transcript?;

    let segments = chunk_transcript(&transcript.text, max_length);
    let stats = ChunkStats::from_segments(&segments);

    Output::header(&format!("Transcript {}", transcript.id));
    Output::kv("Source", &source.source_type().to_string());
    Output::kv("Caption entries", &transcript.entry_count.to_string());
    Output::kv("Length", &format!("~{}", format_duration(transcript.last_caption_seconds)));
    Output::kv("Characters", &stats.total_chars.to_string());
    Output::kv("Max segment length", &max_length.to_string());
    Output::kv("Segments", &stats.segment_count.to_string());
    if stats.segment_count > 0 {
        Output::kv(
            "Segment sizes",
            &format!("{}..{} chars", stats.min_chars, stats.max_chars),
        );
    }
    Output::kv("Generation calls", &format!("{} (plus 1 for the title)", stats.generation_calls()));

    println!();
    for segment in &segments {
        Output::segment(segment);
    }

    Ok(())
}
