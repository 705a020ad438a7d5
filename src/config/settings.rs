//! Configuration settings for Lectern.

use crate::error::{LecternError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub generation: GenerationSettings,
    pub chunking: ChunkingSettings,
    pub summarization: SummarizationSettings,
    pub notes: NotesSettings,
    pub youtube: YoutubeSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data (partial summaries database).
    pub data_dir: String,
    /// Directory where rendered notes are written.
    pub output_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.lectern".to_string(),
            output_dir: "~/lectern-notes".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Text generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Chat model used for titles, segment summaries and the merge pass.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// API base URL (any OpenAI-compatible endpoint).
    pub api_base: Option<String>,
    /// API key. Prefer `api_key_env` to keep secrets out of the config file.
    pub api_key: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            timeout_secs: 300,
            api_base: None,
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

impl GenerationSettings {
    /// Resolve the API key from the config value or the configured environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty()))
    }
}

/// Transcript chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum segment length in characters.
    pub max_length: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            max_length: crate::chunking::DEFAULT_MAX_LENGTH,
        }
    }
}

/// Segment summarization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizationSettings {
    /// Maximum summarization calls in flight. 1 keeps processing strictly sequential.
    pub max_concurrent: usize,
    /// Store partial summaries so a failed run can resume without redoing finished segments.
    pub persist_partials: bool,
}

impl Default for SummarizationSettings {
    fn default() -> Self {
        Self {
            max_concurrent: 1,
            persist_partials: true,
        }
    }
}

/// Notes output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesSettings {
    /// Title used when the model response carries no usable title.
    pub default_title: String,
    /// Output format (pdf, md, txt).
    pub format: String,
}

impl Default for NotesSettings {
    fn default() -> Self {
        Self {
            default_title: "Video Summary".to_string(),
            format: "pdf".to_string(),
        }
    }
}

/// YouTube-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// Caption languages to request, in order of preference.
    pub languages: Vec<String>,
    /// Fall back to automatic captions when a video has no uploaded ones.
    pub include_auto: bool,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string()],
            include_auto: true,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_length == 0 {
            return Err(LecternError::Config(
                "chunking.max_length must be greater than zero".to_string(),
            ));
        }
        if self.summarization.max_concurrent == 0 {
            return Err(LecternError::Config(
                "summarization.max_concurrent must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| LecternError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lectern")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded output directory path.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.output_dir)
    }

    /// Path of the SQLite database holding partial summaries.
    pub fn partials_db_path(&self) -> PathBuf {
        self.data_dir().join("partials.db")
    }
}
