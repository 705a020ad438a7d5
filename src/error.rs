//! Error types for Lectern.

use thiserror::Error;

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Title,
    Chunk,
    /// Summarization of one segment (1-based index).
    Summarize { segment: usize },
    Merge,
    Render,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Fetch => write!(f, "fetching transcript"),
            Stage::Title => write!(f, "generating title"),
            Stage::Chunk => write!(f, "chunking transcript"),
            Stage::Summarize { segment } => write!(f, "summarizing transcript chunk {}", segment),
            Stage::Merge => write!(f, "combining summaries"),
            Stage::Render => write!(f, "rendering notes"),
        }
    }
}

/// Library-level error type for Lectern operations.
#[derive(Error, Debug)]
pub enum LecternError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcript fetch failed: {0}")]
    Fetch(String),

    #[error("Text generation failed: {0}")]
    Generation(String),

    #[error("Render failed: {0}")]
    Render(String),

    #[error("Transcript is empty")]
    EmptyTranscript,

    #[error("{stage}: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<LecternError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Partial store error: {0}")]
    Store(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl LecternError {
    /// Attribute this error to a pipeline stage.
    pub fn at(self, stage: Stage) -> Self {
        LecternError::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// The stage this error was attributed to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            LecternError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Result type alias for Lectern operations.
pub type Result<T> = std::result::Result<T, LecternError>;
