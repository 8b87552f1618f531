use serde_json::{Map, Value};

/// Escape markup in every string value of a JSON value
///
/// Object keys are left as they are.
/// `<` and `>` become entities, so no tag can survive. Entities are never
/// decoded, which keeps the transformation idempotent. Returns `true` when
/// anything changed.
pub fn escape_markup(value: &mut Value) -> bool {
    match value {
        Value::String(s) => escape_in_place(s),
        Value::Array(items) => items.iter_mut().fold(false, |changed, item| escape_markup(item) | changed),
        Value::Object(map) => escape_map(map),
        _ => false,
    }
}

/// Map-level entry point for parsed query strings
pub fn escape_map(map: &mut Map<String, Value>) -> bool {
    map.values_mut().fold(false, |changed, item| escape_markup(item) | changed)
}

fn escape_in_place(s: &mut String) -> bool {
    if !s.contains(['<', '>']) {
        return false;
    }

    *s = s.replace('<', "&lt;").replace('>', "&gt;");
    true
}
