//! CLI module for Lectern.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Lectern - study notes from lecture transcripts
///
/// Fetches a lecture transcript (YouTube captions or a local caption/text file),
/// summarizes it segment by segment and writes one structured notes document.
#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "LECTERN_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Turn one or more transcripts into study notes
    Notes {
        /// YouTube URLs/IDs or local .txt/.srt/.vtt files
        inputs: Vec<String>,

        /// Read additional inputs from a file (one per line, '#' starts a comment)
        #[arg(short, long)]
        list: Option<String>,

        /// Expand playlist/channel URLs into their videos
        #[arg(long)]
        playlist: bool,

        /// Maximum number of videos taken from each playlist
        #[arg(long)]
        limit: Option<usize>,

        /// Output directory (defaults to general.output_dir)
        #[arg(short, long)]
        output: Option<String>,

        /// Output format (pdf, md, txt)
        #[arg(short, long)]
        format: Option<String>,

        /// Discard stored partial summaries from earlier unfinished runs
        #[arg(long)]
        fresh: bool,
    },

    /// Generate and print a title for a transcript
    Title {
        /// YouTube URL/ID or local transcript file
        input: String,
    },

    /// Show how a transcript would be split into segments (no generation calls)
    Chunk {
        /// YouTube URL/ID or local transcript file
        input: String,

        /// Maximum segment length in characters (defaults to chunking.max_length)
        #[arg(short, long)]
        max_length: Option<usize>,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Open configuration file in editor
    Edit,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
