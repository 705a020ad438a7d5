//! YouTube caption source backed by yt-dlp.

use super::captions::parse_json3;
use super::{CaptionEntry, SourceType, TranscriptSource};
use crate::config::YoutubeSettings;
use crate::error::{LecternError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// A video listed from a playlist or channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    pub id: String,
    pub title: String,
}

/// YouTube caption source.
pub struct YoutubeSource {
    video_id_regex: Regex,
    languages: Vec<String>,
    include_auto: bool,
}

impl YoutubeSource {
    pub fn new() -> Self {
        Self::with_settings(&YoutubeSettings::default())
    }

    pub fn with_settings(settings: &YoutubeSettings) -> Self {
        // Matches various YouTube URL formats and bare video IDs
        let video_id_regex = Regex::new(
            r"(?x)
            (?:
                (?:https?://)?
                (?:www\.|m\.)?
                (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/|youtube\.com/live/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("Invalid regex");

        let languages = if settings.languages.is_empty() {
            vec!["en".to_string()]
        } else {
            settings.languages.clone()
        };

        Self {
            video_id_regex,
            languages,
            include_auto: settings.include_auto,
        }
    }

    /// Extract video ID from a YouTube URL or bare ID.
    fn extract_video_id(&self, input: &str) -> Option<String> {
        let caps = self.video_id_regex.captures(input.trim())?;

        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    }

    /// Whether the input names a playlist or channel rather than one video.
    pub fn is_collection(input: &str) -> bool {
        input.contains("youtube.com/playlist")
            || input.contains("list=")
            || input.contains("youtube.com/channel")
            || input.contains("youtube.com/@")
    }

    /// Download subtitles with yt-dlp into `dir`.
    async fn download_subtitles(&self, video_id: &str, dir: &Path) -> Result<()> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);
        let template = dir.join("%(id)s.%(ext)s");
        let sub_langs = self
            .languages
            .iter()
            .map(|l| format!("{}.*", l))
            .collect::<Vec<_>>()
            .join(",");

        let mut command = tokio::process::Command::new("yt-dlp");
        command
            .arg("--skip-download")
            .arg("--write-subs")
            .arg("--sub-format")
            .arg("json3")
            .arg("--sub-langs")
            .arg(&sub_langs)
            .arg("--no-playlist")
            .arg("--no-warnings")
            .arg("--output")
            .arg(&template);
        if self.include_auto {
            command.arg("--write-auto-subs");
        }

        let output = command.arg(&url).output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LecternError::ToolNotFound("yt-dlp".to_string())
            } else {
                LecternError::Fetch(format!("Failed to run yt-dlp: {}", e))
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LecternError::Fetch(format!(
                "Video {} not found or unavailable: {}",
                video_id,
                stderr.trim()
            )));
        }

        Ok(())
    }

    /// Pick the subtitle file matching the most preferred language.
    ///
    /// yt-dlp names files `<id>.<lang>.json3`; a language `en` also matches
    /// regional variants such as `en-US`.
    fn pick_subtitle_file(&self, files: &[PathBuf]) -> Option<PathBuf> {
        fn lang_of(path: &Path) -> Option<String> {
            let name = path.file_name()?.to_str()?;
            let stem = name.strip_suffix(".json3")?;
            stem.rsplit('.').next().map(|s| s.to_string())
        }

        for wanted in &self.languages {
            if let Some(file) = files.iter().find(|f| lang_of(f).as_deref() == Some(wanted.as_str())) {
                return Some(file.clone());
            }
            let prefix = format!("{}-", wanted);
            if let Some(file) = files
                .iter()
                .find(|f| lang_of(f).is_some_and(|l| l.starts_with(&prefix)))
            {
                return Some(file.clone());
            }
        }

        files.first().cloned()
    }

    /// List videos of a playlist or channel.
    #[instrument(skip(self))]
    pub async fn list_videos(&self, source: &str, limit: Option<usize>) -> Result<Vec<VideoRef>> {
        let limit_str = limit.map(|l| l.to_string()).unwrap_or_else(|| "50".to_string());

        let output = tokio::process::Command::new("yt-dlp")
            .args([
                "--dump-json",
                "--no-download",
                "--no-warnings",
                "--flat-playlist",
                "--playlist-end",
                &limit_str,
                source,
            ])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    LecternError::ToolNotFound("yt-dlp".to_string())
                } else {
                    LecternError::Fetch(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LecternError::Fetch(format!("Failed to list videos: {}", stderr.trim())));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(self.parse_listing(&stdout))
    }

    fn parse_listing(&self, stdout: &str) -> Vec<VideoRef> {
        stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
            .filter_map(|json| {
                let id = json["id"]
                    .as_str()
                    .or_else(|| json["url"].as_str())
                    .map(|s| self.extract_video_id(s).unwrap_or_else(|| s.to_string()))?;
                let title = json["title"].as_str().unwrap_or("Unknown Title").to_string();
                Some(VideoRef { id, title })
            })
            .collect()
    }
}

impl Default for YoutubeSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptSource for YoutubeSource {
    fn source_type(&self) -> SourceType {
        SourceType::YouTube
    }

    fn can_handle(&self, input: &str) -> bool {
        self.extract_video_id(input).is_some()
    }

    fn extract_id(&self, input: &str) -> Option<String> {
        self.extract_video_id(input)
    }

    #[instrument(skip(self))]
    async fn fetch_captions(&self, input: &str) -> Result<Vec<CaptionEntry>> {
        let video_id = self.extract_video_id(input).ok_or_else(|| {
            LecternError::InvalidInput(format!("Invalid YouTube video ID or URL: {}", input))
        })?;

        let temp_dir = tempfile::tempdir()?;
        self.download_subtitles(&video_id, temp_dir.path()).await?;

        let files: Vec<PathBuf> = std::fs::read_dir(temp_dir.path())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json3"))
            .collect();
        debug!("yt-dlp produced {} subtitle files", files.len());

        let file = self.pick_subtitle_file(&files).ok_or_else(|| {
            LecternError::Fetch(format!(
                "No captions available for video {} (languages: {})",
                video_id,
                self.languages.join(", ")
            ))
        })?;

        let content = std::fs::read_to_string(&file)?;
        let entries = parse_json3(&content)?;
        info!("Fetched {} caption entries for {}", entries.len(), video_id);

        Ok(entries)
    }
}
