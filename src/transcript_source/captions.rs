//! Caption file parsing (YouTube json3, SRT, WebVTT).

use super::CaptionEntry;
use crate::error::{LecternError, Result};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

#[derive(Debug, Deserialize)]
struct Json3Document {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs", default)]
    start_ms: f64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Parse YouTube's `json3` timed text format.
///
/// Events without text (window definitions, line-break appends) are skipped.
pub fn parse_json3(content: &str) -> Result<Vec<CaptionEntry>> {
    let document: Json3Document = serde_json::from_str(content)
        .map_err(|e| LecternError::Fetch(format!("Invalid json3 captions: {}", e)))?;

    Ok(document
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                None
            } else {
                Some(CaptionEntry::new(event.start_ms / 1000.0, text))
            }
        })
        .collect())
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag regex"))
}

/// Parse SRT or WebVTT content into caption entries.
///
/// Cues are blocks separated by blank lines with a `start --> end` timing
/// line; header, NOTE and STYLE blocks have no timing line and are skipped.
/// Inline markup such as `<c>` or `<i>` is removed.
pub fn parse_timed_text(content: &str) -> Vec<CaptionEntry> {
    let normalized = content.replace("\r\n", "\n");
    let mut entries = Vec::new();

    for block in normalized.split("\n\n") {
        let lines: Vec<&str> = block.lines().collect();
        let Some(timing_pos) = lines.iter().position(|l| l.contains("-->")) else {
            continue;
        };

        let start = lines[timing_pos]
            .split("-->")
            .next()
            .and_then(parse_timestamp)
            .unwrap_or(0.0);

        let text = lines[timing_pos + 1..]
            .iter()
            .map(|l| tag_regex().replace_all(l, "").trim().to_string())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if !text.is_empty() {
            entries.push(CaptionEntry::new(start, text));
        }
    }

    entries
}

/// Parse `HH:MM:SS,mmm`, `HH:MM:SS.mmm` or `MM:SS.mmm` into seconds.
pub fn parse_timestamp(raw: &str) -> Option<f64> {
    let raw = raw.trim().split_whitespace().next()?;
    let parts: Vec<&str> = raw.split(':').collect();

    let seconds: f64 = parts.last()?.replace(',', ".").parse().ok()?;
    let (hours, minutes) = match parts.len() {
        3 => (parts[0].parse::<f64>().ok()?, parts[1].parse::<f64>().ok()?),
        2 => (0.0, parts[0].parse::<f64>().ok()?),
        _ => return None,
    };

    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}
