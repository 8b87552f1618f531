use serde_json::{Map, Value};

/// Collapse repeated top-level parameters to their last value
///
/// Fields named in `whitelist` keep every value. The collapsed arrays are
/// returned so callers can still inspect what was sent.
pub fn normalize_pollution(map: &mut Map<String, Value>, whitelist: &[String]) -> Map<String, Value> {
    let mut polluted = Map::new();

    for (key, value) in map.iter_mut() {
        if whitelist.iter().any(|allowed| allowed == key) {
            continue;
        }

        let Value::Array(items) = &*value else {
            continue;
        };

        let last = items.last().cloned().unwrap_or(Value::Null);
        polluted.insert(key.clone(), std::mem::replace(value, last));
    }

    if !polluted.is_empty() {
        tracing::debug!(fields = ?polluted.keys().collect::<Vec<_>>(), "collapsed repeated parameters");
    }

    polluted
}
