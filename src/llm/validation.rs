use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::models::{ClassificationResult, Color, IntentLevel};

const SUMMARY_KEYS: &[&str] = &["summary"];
const INTENT_KEYS: &[&str] = &["intentLevel", "intent_level"];
const COLOR_KEYS: &[&str] = &["color"];
const SUGGESTED_MESSAGE_KEYS: &[&str] = &["suggestedMessage", "suggested_message"];

/// Slice from the first `{` to the last `}` inclusive, if both exist in order
pub fn extract_json_candidate(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Reconcile raw backend output into a [`ClassificationResult`].
///
/// Never fails. Output that cannot be located or parsed as a JSON object
/// becomes [`ClassificationResult::fallback`]; a parsed object has each field
/// defaulted on its own.
pub fn validate_response(raw: &str) -> ClassificationResult {
    let Some(candidate) = extract_json_candidate(raw) else {
        warn!(raw_len = raw.len(), "No JSON object in backend response, using fallback");
        debug!(raw = %raw, "Unstructured backend response");
        return ClassificationResult::fallback();
    };

    let fields = match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => return ClassificationResult::fallback(),
        Err(e) => {
            warn!("Failed to parse backend JSON: {e}");
            debug!(candidate = %candidate, "Malformed backend JSON");
            return ClassificationResult::fallback();
        }
    };

    ClassificationResult {
        summary: text_field(&fields, SUMMARY_KEYS).unwrap_or_default(),
        intent_level: text_field(&fields, INTENT_KEYS)
            .map(|label| IntentLevel::from_label(&label))
            .unwrap_or(IntentLevel::Unknown),
        color: text_field(&fields, COLOR_KEYS)
            .map(|label| Color::from_label(&label))
            .unwrap_or(Color::Gray),
        suggested_message: text_field(&fields, SUGGESTED_MESSAGE_KEYS).unwrap_or_default(),
    }
}

/// First usable value under `keys`, in order.
///
/// Strings pass through; numbers and booleans are stringified; anything else counts as absent.
fn text_field(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match fields.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}
