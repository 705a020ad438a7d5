//! Notes generation: the chunk-and-merge summarization components.
//!
//! - [`TitleGenerator`] derives a short title from the whole transcript.
//! - [`SegmentSummarizer`] turns each transcript segment into partial notes.
//! - [`SummaryMerger`] folds the partial notes into one document with the
//!   Introduction / Key Sections / Conclusion structure.
//!
//! The components are stateless apart from their generator and prompts; the
//! [`Orchestrator`](crate::orchestrator::Orchestrator) sequences them.

mod merger;
mod summarizer;
mod title;

pub use merger::{SummaryMerger, PARTIAL_SEPARATOR};
pub use summarizer::SegmentSummarizer;
pub use title::{extract_title, file_stem, sanitize_title, TitleGenerator, MAX_TITLE_WORDS, TITLE_MARKER};
