//! Recovery of a JSON object embedded in free-form model output.
//!
//! The candidate span runs from the first `{` to the last `}` in the text.
//! This is a greedy heuristic, not a balanced-brace scan: two objects, or an
//! object followed by stray braces, end up in one span.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static JSON_SPAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("JSON span pattern should compile"));

/// Number of characters of an unparseable span echoed back to the caller
pub const SNIPPET_CHARS: usize = 100;

/// Deepest object/array nesting accepted, matching Python's default recursion limit
pub const MAX_NESTING: usize = 1000;

/// Outcome of extracting structured output from model text
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractedOutput {
    Parsed(Value),
    Malformed(MalformedOutput),
}

/// Error descriptors placed in `result` when the model output is unusable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "error")]
pub enum MalformedOutput {
    #[serde(rename = "JSON valid değil")]
    InvalidJson { raw_snippet: String },
    #[serde(rename = "JSON bloğu bulunamadı")]
    NoJsonBlock { raw: String },
}

impl MalformedOutput {
    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            MalformedOutput::InvalidJson { .. } => "invalid_json",
            MalformedOutput::NoJsonBlock { .. } => "no_json_block",
        }
    }
}

impl ExtractedOutput {
    pub fn is_parsed(&self) -> bool {
        matches!(self, ExtractedOutput::Parsed(_))
    }

    pub fn into_value(self) -> Value {
        match self {
            ExtractedOutput::Parsed(value) => value,
            // Plain enum of strings; serialization cannot fail
            ExtractedOutput::Malformed(m) => serde_json::to_value(m).unwrap_or(Value::Null),
        }
    }
}

/// Substring from the first `{` to the last `}`, if any
pub fn find_json_span(text: &str) -> Option<&str> {
    JSON_SPAN_RE.find(text).map(|m| m.as_str())
}

/// First `max` characters of `s` followed by an ellipsis marker
fn snippet(s: &str, max: usize) -> String {
    let mut out: String = s.chars().take(max).collect();
    out.push_str("...");
    out
}

/// Deepest `{`/`[` nesting outside of string literals
fn nesting_depth(span: &str) -> usize {
    let (mut depth, mut max) = (0usize, 0usize);
    let mut in_string = false;
    let mut escape = false;

    for b in span.bytes() {
        if in_string {
            if escape {
                escape = false;
            } else if b == b'\\' {
                escape = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                max = max.max(depth);
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}

/// Parse a span as one JSON value, keeping number text exactly as written
pub fn parse_span(span: &str) -> Option<Value> {
    if nesting_depth(span) > MAX_NESTING {
        return None;
    }
    let mut de = serde_json::Deserializer::from_str(span);
    de.disable_recursion_limit();
    let value = Value::deserialize(&mut de).ok()?;
    de.end().ok()?;
    Some(value)
}

/// Extract a JSON value from model text, never failing
pub fn extract_output(raw: &str) -> ExtractedOutput {
    match find_json_span(raw) {
        Some(span) => match parse_span(span) {
            Some(value) => ExtractedOutput::Parsed(value),
            None => ExtractedOutput::Malformed(MalformedOutput::InvalidJson {
                raw_snippet: snippet(span, SNIPPET_CHARS),
            }),
        },
        None => ExtractedOutput::Malformed(MalformedOutput::NoJsonBlock {
            raw: raw.to_string(),
        }),
    }
}
