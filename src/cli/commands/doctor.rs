//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::{GenerationSettings, Prompts, Settings};
use crate::render::OutputFormat;
use crate::store::PartialStore;
use console::style;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Lectern Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();
    let mut section = |title: &str, results: Vec<CheckResult>| {
        println!("{}", style(title).bold());
        for check in &results {
            check.print();
        }
        println!();
        checks.extend(results);
    };

    section("External Tools", vec![check_tool("yt-dlp", install_hint_ytdlp())]);
    section("Text Generation", vec![check_api_key(&settings.generation)]);
    section("Configuration", check_config(settings));
    section("Directories", check_directories(settings));

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Lectern.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Lectern is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str, hint: &str) -> CheckResult {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .chars()
                .take(50)
                .collect::<String>();

            CheckResult::ok(name, &version)
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::warning(name, "not found (only needed for YouTube inputs)", hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Check the API key and model configuration.
fn check_api_key(settings: &GenerationSettings) -> CheckResult {
    let name = format!("Model {}", settings.model);
    let endpoint = settings.api_base.as_deref().unwrap_or("api.openai.com");

    match settings.resolve_api_key() {
        Some(key) => CheckResult::ok(
            &name,
            &format!("key configured ({}) for {}", mask_key(&key), endpoint),
        ),
        None if settings.api_base.is_some() => CheckResult::warning(
            &name,
            &format!("no API key for {}", endpoint),
            "Fine for local servers that need no key",
        ),
        None => CheckResult::error(
            &name,
            &format!("{} not set", settings.api_key_env),
            &format!("Set with: export {}='sk-...'", settings.api_key_env),
        ),
    }
}

/// Show only the start and end of a key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check config file, output format and prompt templates.
fn check_config(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let config_path = Settings::default_config_path();
    if config_path.exists() {
        results.push(CheckResult::ok("Config file", &config_path.display().to_string()));
    } else {
        results.push(CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: lectern config init",
        ));
    }

    match settings.notes.format.parse::<OutputFormat>() {
        Ok(format) => results.push(CheckResult::ok("Output format", &format.to_string())),
        Err(e) => results.push(CheckResult::error(
            "Output format",
            &e.to_string(),
            "Set notes.format to pdf, md or txt",
        )),
    }

    results.push(CheckResult::ok(
        "Chunking",
        &format!(
            "{} chars per segment, {} concurrent",
            settings.chunking.max_length, settings.summarization.max_concurrent
        ),
    ));

    match Prompts::load(settings.prompts.custom_dir.as_deref(), Some(&settings.prompts.variables)) {
        Ok(_) => results.push(CheckResult::ok(
            "Prompts",
            settings.prompts.custom_dir.as_deref().unwrap_or("built-in"),
        )),
        Err(e) => results.push(CheckResult::error(
            "Prompts",
            &e.to_string(),
            "Fix the TOML files in prompts.custom_dir",
        )),
    }

    results
}

/// Check data and output directories and the partial summary store.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    for (name, dir) in [("Data directory", settings.data_dir()), ("Output directory", settings.output_dir())] {
        if dir.exists() {
            results.push(CheckResult::ok(name, &dir.display().to_string()));
        } else {
            results.push(CheckResult::warning(
                name,
                &format!("{} (will be created)", dir.display()),
                "Directory will be created on first use",
            ));
        }
    }

    let db_path = settings.partials_db_path();
    if !settings.summarization.persist_partials {
        results.push(CheckResult::ok("Partial summaries", "not persisted"));
    } else if db_path.exists() {
        match PartialStore::new(&db_path).and_then(|store| store.list_runs()) {
            Ok(runs) if runs.is_empty() => {
                results.push(CheckResult::ok("Partial summaries", "no unfinished runs"));
            }
            Ok(runs) => {
                let pending: usize = runs.iter().map(|r| r.partial_count).sum();
                results.push(CheckResult::warning(
                    "Partial summaries",
                    &format!("{} unfinished run(s), {} stored segment summaries", runs.len(), pending),
                    "Rerun 'lectern notes' on those inputs to resume, or pass --fresh",
                ));
            }
            Err(e) => results.push(CheckResult::error(
                "Partial summaries",
                &e.to_string(),
                &format!("Remove {} to reset", db_path.display()),
            )),
        }
    } else {
        results.push(CheckResult::ok("Partial summaries", "store not created yet"));
    }

    results
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript_source::{CaptionEntry, Transcript};

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("sk-abcdefghijklmnop1234"), "sk-abcd...1234");
        assert_eq!(mask_key("short"), "*****");
    }

    #[test]
    fn test_bad_format_is_an_error() {
        let mut settings = Settings::default();
        settings.notes.format = "docx".to_string();

        let results = check_config(&settings);
        let format = results.iter().find(|r| r.name == "Output format").unwrap();
        assert_eq!(format.status, CheckStatus::Error);
    }

    #[test]
    fn test_unfinished_runs_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.general.data_dir = dir.path().to_string_lossy().to_string();
        let transcript = Transcript::from_captions("vid", "lecture.txt", &[CaptionEntry::new(0.0, "words")]);
        PartialStore::new(&settings.partials_db_path())
            .unwrap()
            .save_title(&transcript, "Lecture")
            .unwrap();

        let results = check_directories(&settings);
        let partials = results.iter().find(|r| r.name == "Partial summaries").unwrap();
        assert_eq!(partials.status, CheckStatus::Warning);
    }
}
