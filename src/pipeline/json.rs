use serde_json::Value;

use crate::error::PipelineError;

/// Trims the text and drops a surrounding Markdown code fence, including
/// its language tag line.
pub fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

pub fn parse_payload(text: &str) -> Result<Value, PipelineError> {
    let body = strip_fences(text);
    if body.is_empty() {
        return Err(PipelineError::Parse("empty payload".to_string()));
    }
    serde_json::from_str(body).map_err(|e| PipelineError::Parse(e.to_string()))
}

/// `{"key": {...}}` -> `{...}`; anything else is returned as is.
pub fn unwrap_envelope(value: Value, key: &str) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 1 && map.get(key).is_some_and(Value::is_object) => {
            map.remove(key).unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// True when the trimmed text is a JSON object or array that parses.
pub fn is_json_shaped(text: &str) -> bool {
    let t = text.trim();
    let bracketed = (t.starts_with('{') && t.ends_with('}')) || (t.starts_with('[') && t.ends_with(']'));
    bracketed && serde_json::from_str::<Value>(t).is_ok()
}
