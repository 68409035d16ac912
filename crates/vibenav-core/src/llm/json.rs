//! Best-effort JSON extraction from model output

use serde_json::Value;

/// Remove a surrounding ``` / ```json fence if present
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest.strip_prefix("json").unwrap_or(rest);
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parse a JSON object from model output.
///
/// Tries the fence-stripped text as-is, then the span between the first `{`
/// and the last `}`.
pub fn extract_json_object(raw: &str) -> Option<Value> {
    let text = strip_code_fences(raw);

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Parse a JSON list of strings, normalised to trimmed lowercase.
///
/// Returns `None` when the text is not a JSON array; non-string items are
/// skipped.
pub fn parse_string_list(raw: &str) -> Option<Vec<String>> {
    let text = strip_code_fences(raw);
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        ),
        _ => None,
    }
}
