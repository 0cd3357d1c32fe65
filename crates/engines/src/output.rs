//! Parsing of engine output into the normalized result schema.
//!
//! Engines are asked for a bare JSON object but do not always comply:
//! output may arrive wrapped in a code fence, surrounded by prose, or as
//! plain markdown with no JSON at all. Parsing degrades gracefully through
//! those cases instead of failing the review.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{InlineComment, ReviewResult, Severity, UsageMetadata};

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

lazy_static! {
    /// Matches a JSON object wrapped in a markdown code fence.
    static ref FENCED_JSON_REGEX: Regex = Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```")
        .expect("Failed to compile fenced JSON regex");

    /// Matches ANSI color escape sequences.
    static ref ANSI_ESCAPE_REGEX: Regex =
        Regex::new(r"\x1b\[[0-9;]*m").expect("Failed to compile ANSI escape regex");

    /// Lines worth surfacing from engine stderr, most specific first.
    static ref ERROR_LINE_REGEXES: [Regex; 2] = [
        Regex::new(r"(?i)error:\s*[^\n]*").expect("Failed to compile error line regex"),
        Regex::new(r"(?i)unexpected status\s+\d{3}[^\n]*")
            .expect("Failed to compile status line regex"),
    ];
}

/// Parses raw engine stdout into a [`ReviewResult`].
///
/// Returns `None` only when the output is blank. Non-JSON output becomes a
/// result whose summary is the raw text.
pub(crate) fn parse_review_output(raw: &str, provider: &str) -> Option<ReviewResult> {
    let sanitized = raw.trim();
    if sanitized.is_empty() {
        return None;
    }

    let Some(data) = extract_json_payload(sanitized) else {
        warn!(
            provider,
            "Engine response was not JSON, using raw text as the summary"
        );
        return Some(ReviewResult {
            provider: provider.to_string(),
            summary: sanitized.to_string(),
            inline_comments: Vec::new(),
            overall_severity: None,
            model: None,
            usage: UsageMetadata {
                engine_calls: 1,
                ..UsageMetadata::default()
            },
            success: true,
            error_message: None,
        });
    };

    let summary = data
        .get("summary_markdown")
        .or_else(|| data.get("summary"))
        .or_else(|| data.get("report"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(sanitized)
        .to_string();

    let overall_severity = data
        .get("overall_severity")
        .or_else(|| data.get("severity"))
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<Severity>().ok());

    let inline_comments = data
        .get("inline_comments")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(parse_inline_comment)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    Some(ReviewResult {
        provider: provider.to_string(),
        summary,
        inline_comments,
        overall_severity,
        model: None,
        usage: UsageMetadata {
            engine_calls: 1,
            ..UsageMetadata::default()
        },
        success: true,
        error_message: None,
    })
}

fn parse_inline_comment(item: &Value) -> Option<InlineComment> {
    let obj = item.as_object()?;

    let path = obj
        .get("path")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|p| !p.is_empty())?
        .to_string();

    let comment = obj
        .get("comment")
        .or_else(|| obj.get("body"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|c| !c.is_empty())?
        .to_string();

    // Some engines emit a single "line" with a side marker instead of the
    // explicit new_line/old_line pair.
    let line_type = obj
        .get("line_type")
        .and_then(Value::as_str)
        .unwrap_or("new")
        .to_lowercase();

    let generic_line = coerce_line(obj.get("line"));
    let new_line = coerce_line(obj.get("new_line"))
        .or_else(|| (line_type == "new").then_some(generic_line).flatten());
    let old_line = coerce_line(obj.get("old_line"))
        .or_else(|| (line_type == "old").then_some(generic_line).flatten());

    if new_line.is_none() && old_line.is_none() {
        debug!(path = path.as_str(), "Dropping inline comment without a line anchor");
        return None;
    }

    let severity = obj
        .get("severity")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<Severity>().ok());

    let suggestion = obj
        .get("suggestion")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Some(InlineComment {
        path,
        new_line,
        old_line,
        severity,
        comment,
        suggestion,
    })
}

fn coerce_line(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Extracts a JSON object from engine output.
///
/// Tries the whole text first, then a fenced code block, then the outermost
/// brace pair.
pub(crate) fn extract_json_payload(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        if value.is_object() {
            return Some(value);
        }
    }

    if let Some(captures) = FENCED_JSON_REGEX.captures(text) {
        if let Ok(value) = serde_json::from_str::<Value>(&captures[1]) {
            if value.is_object() {
                return Some(value);
            }
        }
    }

    let first = text.find('{')?;
    let last = text.rfind('}')?;
    if last > first {
        if let Ok(value) = serde_json::from_str::<Value>(&text[first..=last]) {
            if value.is_object() {
                return Some(value);
            }
        }
    }

    None
}

/// Distills engine stderr/stdout into the single most actionable line.
///
/// Strips ANSI color codes, prefers explicit error lines, and otherwise
/// falls back to the last non-noise line of output.
pub(crate) fn extract_actionable_error(stderr: &str, stdout: &str) -> String {
    let combined = [stderr.trim(), stdout.trim()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n");

    if combined.is_empty() {
        return String::new();
    }

    let combined = ANSI_ESCAPE_REGEX.replace_all(&combined, "");

    for regex in ERROR_LINE_REGEXES.iter() {
        if let Some(found) = regex.find(&combined) {
            return found.as_str().trim().to_string();
        }
    }

    let lines: Vec<&str> = combined
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    lines
        .iter()
        .rev()
        .find(|line| !line.starts_with("Reconnecting..."))
        .or_else(|| lines.last())
        .map(|line| line.to_string())
        .unwrap_or_default()
}
