use serde_json::Value as JsonValue;

const ERROR_FIELDS: [&str; 2] = ["error", "errorMessage"];

const FALLBACK_MESSAGE: &str = "Network response was not OK.";
const UNKNOWN_MESSAGE: &str = "Unable to determine error message.";
const UNSERIALIZABLE: &str = "[unserializable responseData]";

/// Maximum number of characters of a body kept in an error message.
///
/// Counted in Unicode scalar values (`char`s), not bytes or UTF-16 units.
pub const PREVIEW_LIMIT: usize = 500;

/// Derives the human-readable part of an error message from a parsed body.
///
/// Objects and arrays are searched for a string under `error`, then
/// `errorMessage`. Scalars (including raw text bodies) carry no field to look
/// at.
pub fn error_message(data: &JsonValue) -> &str {
    match data {
        JsonValue::Object(map) => ERROR_FIELDS
            .iter()
            .find_map(|key| map.get(*key).and_then(JsonValue::as_str))
            .unwrap_or(FALLBACK_MESSAGE),
        JsonValue::Array(_) => FALLBACK_MESSAGE,
        _ => UNKNOWN_MESSAGE,
    }
}

/// Renders a parsed body for an error message, capped at [`PREVIEW_LIMIT`]
/// characters with a trailing `...` when cut.
pub fn preview(data: &JsonValue) -> String {
    let text = match data {
        JsonValue::String(text) => text.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| UNSERIALIZABLE.to_owned()),
    };
    truncate(text)
}

fn truncate(text: String) -> String {
    match text.char_indices().nth(PREVIEW_LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text,
    }
}
