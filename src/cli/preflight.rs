//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::{GenerationSettings, Settings};
use crate::error::{LecternError, Result};
use std::path::Path;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Generating notes or titles requires an API key (and yt-dlp for YouTube inputs).
    Generate,
    /// Fetching transcripts only requires yt-dlp for YouTube inputs.
    Fetch,
}

/// Run pre-flight checks for the given operation and inputs.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings, inputs: &[String]) -> Result<()> {
    if operation == Operation::Generate {
        check_api_key(&settings.generation)?;
    }
    if needs_ytdlp(inputs) {
        check_tool("yt-dlp")?;
    }
    Ok(())
}

/// Whether any input is not a local file and will go through yt-dlp.
fn needs_ytdlp(inputs: &[String]) -> bool {
    inputs.iter().any(|input| !Path::new(input).is_file())
}

/// Check that an API key is configured.
///
/// A custom `api_base` may point at a server that needs no key, so the check
/// only applies to the default endpoint.
fn check_api_key(settings: &GenerationSettings) -> Result<()> {
    if settings.api_base.is_some() || settings.resolve_api_key().is_some() {
        return Ok(());
    }

    Err(LecternError::Config(format!(
        "{} not set. Set it with: export {}='sk-...' (or generation.api_key in the config file)",
        settings.api_key_env, settings.api_key_env
    )))
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(LecternError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(LecternError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(LecternError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_inputs_do_not_need_ytdlp() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let inputs = vec![file.path().to_string_lossy().to_string()];

        assert!(!needs_ytdlp(&inputs));
        assert!(needs_ytdlp(&["dQw4w9WgXcQ".to_string()]));
    }

    #[test]
    fn test_fetch_of_local_files_has_no_requirements() {
        let file = tempfile::Builder::new().suffix(".srt").tempfile().unwrap();
        let inputs = vec![file.path().to_string_lossy().to_string()];

        assert!(check(Operation::Fetch, &Settings::default(), &inputs).is_ok());
    }

    #[test]
    fn test_api_key_check() {
        let missing = GenerationSettings {
            api_key: None,
            api_key_env: "LECTERN_TEST_UNSET_KEY_VAR".to_string(),
            ..Default::default()
        };
        assert!(matches!(check_api_key(&missing), Err(LecternError::Config(_))));

        let local_server = GenerationSettings {
            api_base: Some("http://localhost:8080/v1".to_string()),
            ..missing.clone()
        };
        assert!(check_api_key(&local_server).is_ok());
    }
}
