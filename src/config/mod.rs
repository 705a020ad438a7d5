//! Configuration module for Lectern.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{MergePrompts, Prompts, SummaryPrompts, TitlePrompts};
pub use settings::{
    ChunkingSettings, GeneralSettings, GenerationSettings, NotesSettings, PromptSettings,
    Settings, SummarizationSettings, YoutubeSettings,
};
