//! Lectern - study notes from lecture transcripts
//!
//! A CLI tool and library that turns long lecture transcripts into structured
//! study notes.
//!
//! # Overview
//!
//! A transcript is fetched (YouTube captions or a local caption/text file),
//! given a short title, split into bounded segments, summarized one segment
//! at a time and merged into a single document with an introduction, key
//! sections and a conclusion. The result is written as PDF, Markdown or text.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `transcript_source` - Transcript sources (YouTube via yt-dlp, local files)
//! - `chunking` - Length-bounded segmentation
//! - `generation` - Text generation backends
//! - `notes` - Title generation, segment summaries and the merge pass
//! - `render` - Document renderers
//! - `store` - Partial summaries of unfinished runs
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use lectern::config::Settings;
//! use lectern::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let result = orchestrator.process("lectures/week-3.srt", false).await?;
//!     println!("Wrote {}", result.output_path.display());
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod notes;
pub mod openai;
pub mod orchestrator;
pub mod render;
pub mod store;
pub mod transcript_source;

pub use error::{LecternError, Result};
