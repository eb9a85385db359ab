//! Loose JSON detection and parsing
//!
//! Stored field values sometimes arrive as JSON text rather than structured
//! data, and authored inputs may use JavaScript object-literal syntax
//! (single quotes, bare keys, trailing commas). Both are accepted here.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static SINGLE_QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'((?:[^'\\]|\\.)*)'").expect("quote regex is valid"));
static BARE_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([{,]\s*)([A-Za-z_$][A-Za-z0-9_$]*)\s*:"#).expect("key regex is valid")
});
static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([}\]])").expect("comma regex is valid"));

/// True if the text is delimited like a JSON object or array
#[must_use]
pub fn looks_like_json(text: &str) -> bool {
    let t = text.trim();
    (t.starts_with('{') && t.ends_with('}')) || (t.starts_with('[') && t.ends_with(']'))
}

/// Parse strict or loose JSON text; `None` if it is not JSON-shaped
#[must_use]
pub fn parse_loose_json(text: &str) -> Option<Value> {
    if !looks_like_json(text) {
        return None;
    }
    serde_json::from_str(text)
        .ok()
        .or_else(|| serde_json::from_str(&normalize(text)).ok())
}

/// Decode a value that may hold JSON text; other values pass through
#[must_use]
pub fn decode_embedded(value: &Value) -> Value {
    match value {
        Value::String(s) => parse_loose_json(s).unwrap_or_else(|| value.clone()),
        other => other.clone(),
    }
}

fn normalize(text: &str) -> String {
    let quoted = SINGLE_QUOTED.replace_all(text.trim(), "\"$1\"");
    let keyed = BARE_KEY.replace_all(&quoted, "$1\"$2\":");
    TRAILING_COMMA.replace_all(&keyed, "$1").into_owned()
}
