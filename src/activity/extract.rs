//! Pulling JSON out of raw generator text.
//!
//! Language models wrap their output in prose and markdown fences. The
//! extractor tries, in order:
//! 1. A fenced code block (```json or bare ```)
//! 2. The whole text, if it is JSON
//! 3. The first balanced `[...]` array
//! 4. The first balanced `{...}` object
//!
//! An object of the form `{"activities": [...]}` is unwrapped to its list.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::error::GenerationError;

static CODE_FENCE: OnceLock<Regex> = OnceLock::new();

const WRAPPER_KEYS: [&str; 3] = ["activities", "items", "questions"];

/// Extracts the activity payload from generator text.
///
/// # Errors
///
/// `GenerationError::Truncated` when JSON starts but never closes, and
/// `GenerationError::NoJson` when nothing JSON-like is present.
pub fn extract_activity_payload(text: &str) -> Result<Value, GenerationError> {
    let value = extract_json_value(text)?;
    Ok(unwrap_activity_list(value))
}

/// Finds the first parseable JSON value in `text`.
pub fn extract_json_value(text: &str) -> Result<Value, GenerationError> {
    let trimmed = text.trim();

    let fence = CODE_FENCE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json|JSON)?[ \t]*\r?\n?(.*?)```").expect("valid code fence regex")
    });
    for captures in fence.captures_iter(trimmed) {
        if let Some(body) = captures.get(1) {
            if let Ok(value) = serde_json::from_str::<Value>(body.as_str().trim()) {
                return Ok(value);
            }
        }
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    for (open, close) in [('[', ']'), ('{', '}')] {
        if let Some(start) = trimmed.find(open) {
            if let Some(end) = find_matching(&trimmed[start..], open, close) {
                let candidate = &trimmed[start..=start + end];
                if let Ok(value) = serde_json::from_str::<Value>(candidate) {
                    return Ok(value);
                }
            }
        }
    }

    let unclosed = unclosed_delimiters(trimmed);
    if unclosed > 0 {
        return Err(GenerationError::Truncated { unclosed });
    }

    let preview: String = trimmed.chars().take(50).collect();
    Err(GenerationError::NoJson(preview))
}

/// Replaces a wrapper object with the list it holds. Other values pass
/// through.
fn unwrap_activity_list(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            for key in WRAPPER_KEYS {
                if map.get(key).is_some_and(Value::is_array) {
                    if let Some(list) = map.remove(key) {
                        return list;
                    }
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}

/// Byte index of the delimiter closing the one at the start of `s`.
fn find_matching(s: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Number of `{`/`[` left open, counting from the first one.
fn unclosed_delimiters(s: &str) -> usize {
    let Some(start) = s.find(['{', '[']) else {
        return 0;
    };

    let mut depth: isize = 0;
    let mut in_string = false;
    let mut escaped = false;
    for c in s[start..].chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => depth -= 1,
            _ => {}
        }
    }
    depth.max(0) as usize
}
