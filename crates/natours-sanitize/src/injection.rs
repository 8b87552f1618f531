use serde_json::{Map, Value};

/// Whether a key could be read as a query operator or a nested path
fn is_prohibited(key: &str) -> bool {
    key.starts_with('$') || key.contains('.')
}

/// Remove or rewrite object keys that start with `$` or contain `.`
///
/// With `replace_with` set, a leading `$` and every `.` are replaced and the
/// value is kept; otherwise the whole entry is dropped. Descends into nested
/// objects and arrays. Returns `true` when anything changed.
pub fn sanitize_keys(value: &mut Value, replace_with: Option<&str>) -> bool {
    match value {
        Value::Object(map) => sanitize_map(map, replace_with),
        Value::Array(items) => items
            .iter_mut()
            .fold(false, |changed, item| sanitize_keys(item, replace_with) | changed),
        _ => false,
    }
}

/// Map-level entry point for parsed query strings
pub fn sanitize_map(map: &mut Map<String, Value>, replace_with: Option<&str>) -> bool {
    let mut changed = false;

    let entries = std::mem::take(map);
    for (key, mut item) in entries {
        changed |= sanitize_keys(&mut item, replace_with);

        if !is_prohibited(&key) {
            map.insert(key, item);
            continue;
        }

        changed = true;
        match replace_with {
            Some(replacement) => {
                let rewritten = rewrite_key(&key, replacement);
                tracing::debug!(key, rewritten, "rewrote query operator key");
                map.insert(rewritten, item);
            }
            None => tracing::debug!(key, "removed query operator key"),
        }
    }

    changed
}

fn rewrite_key(key: &str, replacement: &str) -> String {
    let rest = key.strip_prefix('$').unwrap_or(key);
    let mut rewritten = String::with_capacity(key.len());
    if rest.len() != key.len() {
        rewritten.push_str(replacement);
    }
    rewritten.push_str(&rest.replace('.', replacement));
    rewritten
}
