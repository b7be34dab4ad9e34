//! Best-effort recovery of structured payloads from raw model output.
//!
//! Model responses *should* be a single JSON object, but in practice arrive
//! wrapped in prose or code fences, or with minor syntax defects (single
//! quotes, trailing commas, unquoted keys). Recovery is an ordered cascade
//! of strategies; the first strict parse that yields an object wins, and the
//! parsed value is then validated and shape-detected. Every failure mode is
//! a [`ParseFailure`] value, never a panic.

use crate::error::ParseFailure;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Ordered key -> text map. Values are guaranteed to be JSON strings by the
/// validation in this module; serde_json's `preserve_order` feature keeps
/// keys in the order the model produced them.
pub type StringMap = serde_json::Map<String, Value>;

/// A validated, shape-detected model payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelPayload {
    /// Extraction response: rewritten source plus the extracted string map.
    Extraction {
        updated_code: String,
        strings: StringMap,
    },
    /// Translation response: a flat key -> translated text map.
    Translation(StringMap),
}

/// Parse raw model output into a validated payload.
pub fn parse_model_output(raw: &str) -> Result<ModelPayload, ParseFailure> {
    let value = recover_value(raw)?;
    classify(value, raw)
}

/// The recovery cascade. Attempted in order, first success wins:
/// 1. strip code fences, strict-parse the full remaining text;
/// 2. strict-parse the largest brace-delimited substring;
/// 3. strict-parse every balanced brace-delimited substring, longest first;
/// 4. apply a textual repair pass and strict-parse once more.
fn recover_value(raw: &str) -> Result<Value, ParseFailure> {
    let stripped = strip_code_fences(raw);
    let content = stripped.trim();

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(content) {
        return Ok(value);
    }

    let outer_span = largest_brace_span(content);
    if let Some(span) = outer_span {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(span) {
            return Ok(value);
        }
    }

    let mut candidates = balanced_objects(content);
    candidates.sort_by_key(|span| std::cmp::Reverse(span.len()));
    for span in candidates {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(span) {
            return Ok(value);
        }
    }

    let repaired = repair_json(outer_span.unwrap_or(content));
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(&repaired) {
        return Ok(value);
    }

    Err(ParseFailure::new("no structured payload recovered", raw))
}

/// Remove fenced-code markers (```json ... ``` and friends).
pub(crate) fn strip_code_fences(raw: &str) -> String {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| Regex::new(r"```[a-zA-Z]*").unwrap());
    fence.replace_all(raw, "").into_owned()
}

/// The substring from the first `{` to the last `}`, if any.
fn largest_brace_span(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if start < end {
        Some(&content[start..=end])
    } else {
        None
    }
}

/// Every balanced `{...}` substring at nesting depth 0 or 1.
///
/// The scan does not understand string literals, so braces inside quoted
/// text can confuse it; the earlier strategies handle well-formed payloads
/// and this one only has to salvage loosely structured output.
fn balanced_objects(content: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut stack: Vec<usize> = Vec::new();

    for (idx, ch) in content.char_indices() {
        match ch {
            '{' => stack.push(idx),
            '}' => {
                if let Some(start) = stack.pop() {
                    if stack.len() <= 1 {
                        spans.push(&content[start..=idx]);
                    }
                }
            }
            _ => {}
        }
    }
    spans
}

/// Textual repair pass for common model JSON defects: single-quoted strings,
/// bare identifier keys, and trailing commas.
fn repair_json(content: &str) -> String {
    static BARE_KEY: OnceLock<Regex> = OnceLock::new();
    static TRAILING_COMMA: OnceLock<Regex> = OnceLock::new();

    let normalized = normalize_quotes(content);

    let bare_key = BARE_KEY
        .get_or_init(|| Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)(\s*:)").unwrap());
    let quoted = bare_key.replace_all(&normalized, "$1\"$2\"$3");

    let trailing = TRAILING_COMMA.get_or_init(|| Regex::new(r",\s*([}\]])").unwrap());
    trailing.replace_all(&quoted, "$1").into_owned()
}

/// Convert single-quoted string literals to double-quoted ones, escaping any
/// embedded double quotes. Apostrophes inside double-quoted strings are left
/// alone.
fn normalize_quotes(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    let mut in_double = false;

    while i < chars.len() {
        let c = chars[i];
        if in_double {
            out.push(c);
            if c == '\\' && i + 1 < chars.len() {
                i += 1;
                out.push(chars[i]);
            } else if c == '"' {
                in_double = false;
            }
            i += 1;
        } else if c == '"' {
            in_double = true;
            out.push(c);
            i += 1;
        } else if c == '\'' {
            match chars[i + 1..].iter().position(|&ch| ch == '\'') {
                Some(rel) => {
                    let end = i + 1 + rel;
                    out.push('"');
                    for &ch in &chars[i + 1..end] {
                        if ch == '"' {
                            out.push('\\');
                        }
                        out.push(ch);
                    }
                    out.push('"');
                    i = end + 1;
                }
                None => {
                    out.push(c);
                    i += 1;
                }
            }
        } else {
            out.push(c);
            i += 1;
        }
    }
    out
}

/// Validation and shape detection for a recovered JSON value.
///
/// An object carrying `updated_code`/`i18n_json` is an extraction result;
/// a plain object whose values are all strings is a translation result.
/// Anything else invalidates the parse.
fn classify(value: Value, raw: &str) -> Result<ModelPayload, ParseFailure> {
    let Value::Object(map) = value else {
        return Err(ParseFailure::new("payload is not a JSON object", raw));
    };

    if map.contains_key("updated_code") || map.contains_key("i18n_json") {
        let updated_code = map
            .get("updated_code")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ParseFailure::new("extraction payload lacks a textual 'updated_code' field", raw)
            })?
            .to_string();
        let strings = map
            .get("i18n_json")
            .ok_or_else(|| ParseFailure::new("extraction payload lacks 'i18n_json'", raw))?;
        let strings = validate_extraction_strings(strings, raw)?;
        return Ok(ModelPayload::Extraction {
            updated_code,
            strings,
        });
    }

    validate_flat_strings(&map, raw)?;
    Ok(ModelPayload::Translation(map))
}

fn validate_extraction_strings(value: &Value, raw: &str) -> Result<StringMap, ParseFailure> {
    let Value::Object(map) = value else {
        return Err(ParseFailure::new("'i18n_json' is not an object", raw));
    };

    for (key, value) in map {
        if !is_identifier_safe(key) {
            return Err(ParseFailure::new(
                format!("'i18n_json' key {:?} is not identifier-safe", key),
                raw,
            ));
        }
        match value.as_str() {
            Some(text) if !text.is_empty() => {}
            Some(_) => {
                return Err(ParseFailure::new(
                    format!("'i18n_json' value for {:?} is empty", key),
                    raw,
                ))
            }
            None => {
                return Err(ParseFailure::new(
                    format!("'i18n_json' value for {:?} is not text", key),
                    raw,
                ))
            }
        }
    }
    Ok(map.clone())
}

fn validate_flat_strings(map: &StringMap, raw: &str) -> Result<(), ParseFailure> {
    for (key, value) in map {
        if key.is_empty() {
            return Err(ParseFailure::new("translation payload has an empty key", raw));
        }
        if !value.is_string() {
            return Err(ParseFailure::new(
                format!("translation value for {:?} is not text", key),
                raw,
            ));
        }
    }
    Ok(())
}

/// Keys must be usable as translation identifiers: alphanumerics,
/// underscores, and dots for namespacing.
fn is_identifier_safe(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}
