//! Turns a raw inference response body into a canonical `PipelineResult`.
//!
//! The body is untrusted and its shape depends on the backend, so detection is
//! an ordered list of shape matchers. Nothing here fails: malformed pieces are
//! recovered where possible and otherwise degrade to empty arguments or no text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::types::{ActionCall, PipelineResult};

/// Reasoning blocks emitted by thinking models.
static REASONING_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").unwrap());

pub fn strip_reasoning(text: &str) -> String {
    REASONING_BLOCK.replace_all(text, "").to_string()
}

type ShapeMatcher = fn(&Value) -> Option<PipelineResult>;

/// Tried in order. Each returns `None` when the body is not in its shape.
const SHAPE_MATCHERS: &[(&str, ShapeMatcher)] = &[
    ("chat_completion", match_chat_completion),
    ("flat", match_flat),
    ("wrapped_flat", match_wrapped_flat),
    ("plain_text", match_plain_text),
];

/// Normalize a raw response. Action calls from the first shape that carries
/// any win; otherwise the first non-empty text is used.
pub fn normalize_response(raw: &Value) -> PipelineResult {
    let mut fallback_text: Option<String> = None;

    for (label, matcher) in SHAPE_MATCHERS {
        let Some(result) = matcher(raw) else {
            continue;
        };
        if !result.action_calls.is_empty() {
            debug!(shape = *label, calls = result.action_calls.len(), "Matched response shape");
            return PipelineResult {
                action_calls: result.action_calls,
                text: None,
            };
        }
        if fallback_text.is_none() {
            fallback_text = result.text;
        }
    }

    PipelineResult {
        action_calls: Vec::new(),
        text: fallback_text,
    }
}

/// `{"choices":[{"message":{"content":..,"tool_calls":[{"function":{..}}]}}]}`
fn match_chat_completion(raw: &Value) -> Option<PipelineResult> {
    let message = raw.get("choices")?.get(0)?.get("message")?;
    if !message.is_object() {
        return None;
    }
    Some(PipelineResult {
        action_calls: parse_calls(message.get("tool_calls")),
        text: extract_text(message.get("content")),
    })
}

/// `{"response": "...", "tool_calls": [{"name": .., "arguments": ..}]}`
fn match_flat(raw: &Value) -> Option<PipelineResult> {
    let obj = raw.as_object()?;
    if !obj.contains_key("tool_calls") && !obj.contains_key("response") {
        return None;
    }
    Some(PipelineResult {
        action_calls: parse_calls(obj.get("tool_calls")),
        text: extract_text(obj.get("response")),
    })
}

/// The flat shape nested under `result`, as some gateways return it.
fn match_wrapped_flat(raw: &Value) -> Option<PipelineResult> {
    match_flat(raw.get("result")?)
}

fn match_plain_text(raw: &Value) -> Option<PipelineResult> {
    Some(PipelineResult {
        action_calls: Vec::new(),
        text: extract_text(Some(raw)),
    })
}

fn extract_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.clone(),
        // Content-part arrays: [{"type":"text","text":"..."}]
        Value::Array(parts) => parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => return None,
    };
    let cleaned = strip_reasoning(&text).trim().to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn parse_calls(value: Option<&Value>) -> Vec<ActionCall> {
    let Some(calls) = value.and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    calls.iter().filter_map(parse_call).collect()
}

fn parse_call(raw: &Value) -> Option<ActionCall> {
    // Chat shape nests under "function"; flat shape does not.
    let func = raw.get("function").unwrap_or(raw);
    let name = func.get("name")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }
    let arguments = parse_arguments(func.get("arguments").or_else(|| func.get("parameters")));
    Some(ActionCall::new(name, deep_parse(arguments)))
}

fn parse_arguments(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(s)) => parse_argument_string(s),
        _ => Map::new(),
    }
}

/// Parse a string-encoded arguments object, recovering what we can.
pub fn parse_argument_string(raw: &str) -> Map<String, Value> {
    let cleaned = strip_reasoning(raw);
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Map::new();
    }

    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(map)) => return map,
        // Double-encoded: the object arrived as a JSON string literal.
        Ok(Value::String(inner)) => {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(inner.trim()) {
                return map;
            }
        }
        _ => {}
    }

    if let Some(map) = first_embedded_object(cleaned) {
        debug!("Recovered arguments from embedded JSON object");
        return map;
    }

    warn!(
        raw = %crate::utils::truncate_str(cleaned, 200),
        "Unparseable tool arguments, using empty arguments"
    );
    Map::new()
}

/// First well-formed `{...}` found in `text`, scanning from each `{` in turn.
fn first_embedded_object(text: &str) -> Option<Map<String, Value>> {
    for (idx, _) in text.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&text[idx..]).into_iter::<Value>();
        if let Some(Ok(Value::Object(map))) = stream.next() {
            return Some(map);
        }
    }
    None
}

/// Opportunistically decode argument values that are themselves JSON
/// arrays/objects encoded as strings.
pub fn deep_parse(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| (key, deep_parse_value(value)))
        .collect()
}

fn deep_parse_value(value: Value) -> Value {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            let looks_nested = (trimmed.starts_with('[') && trimmed.ends_with(']'))
                || (trimmed.starts_with('{') && trimmed.ends_with('}'));
            if looks_nested {
                if let Ok(parsed) = serde_json::from_str::<Value>(trimmed) {
                    return deep_parse_value(parsed);
                }
            }
            Value::String(s)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(deep_parse_value).collect()),
        Value::Object(map) => Value::Object(deep_parse(map)),
        other => other,
    }
}
