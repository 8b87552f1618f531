use serde_json::map::Entry;
use serde_json::{Map, Value};
use url::form_urlencoded;

/// Bracket segments beyond this depth are kept as a literal key
const MAX_DEPTH: usize = 5;
/// Numeric segments above this are object keys, not array indices
const MAX_ARRAY_INDEX: usize = 20;

enum Segment {
    Key(String),
    Push,
}

/// Parse `application/x-www-form-urlencoded` data with bracket nesting
///
/// Repeated keys collect into arrays, `a[]=x` appends, `a[b]=x` nests and
/// objects keyed only by small indices (`a[0]`, `a[1]`) become arrays.
pub fn parse_nested(input: &[u8]) -> Map<String, Value> {
    let mut root = Map::new();

    for (key, value) in form_urlencoded::parse(input) {
        let segments = split_key(&key);
        let Some((Segment::Key(first), rest)) = segments.split_first() else {
            continue;
        };
        insert(&mut root, first, rest, Value::String(value.into_owned()));
    }

    root.values_mut().for_each(compact_arrays);
    root
}

/// Encode a parsed map back into a query string
///
/// Arrays of scalars repeat their key so parsing the output yields the same
/// structure again.
pub fn encode_nested(map: &Map<String, Value>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in map {
        append(&mut serializer, key, value);
    }
    serializer.finish()
}

fn split_key(key: &str) -> Vec<Segment> {
    let (root, mut rest) = match key.find('[') {
        None | Some(0) if key.is_empty() => return Vec::new(),
        None | Some(0) => return vec![Segment::Key(key.to_owned())],
        Some(i) => key.split_at(i),
    };

    let mut segments = vec![Segment::Key(root.to_owned())];
    while segments.len() <= MAX_DEPTH {
        let Some(open) = rest.strip_prefix('[') else {
            break;
        };
        let Some(close) = open.find(']') else {
            break;
        };

        let inner = &open[..close];
        segments.push(if inner.is_empty() {
            Segment::Push
        } else {
            Segment::Key(inner.to_owned())
        });
        rest = &open[close + 1..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Key(rest.to_owned()));
    }

    segments
}

fn insert(map: &mut Map<String, Value>, key: &str, rest: &[Segment], value: Value) {
    match rest.split_first() {
        None => match map.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
            Entry::Occupied(mut slot) => push_into(slot.get_mut(), value),
        },
        Some((Segment::Push, tail)) => {
            let slot = map.entry(key).or_insert_with(|| Value::Array(Vec::new()));
            push_into(slot, build(tail, value));
        }
        Some((Segment::Key(next), tail)) => {
            let slot = map.entry(key).or_insert_with(|| Value::Object(Map::new()));
            match slot {
                Value::Object(child) => insert(child, next, tail, value),
                other => push_into(other, build(rest, value)),
            }
        }
    }
}

fn build(segments: &[Segment], value: Value) -> Value {
    match segments.split_first() {
        None => value,
        Some((Segment::Push, tail)) => Value::Array(vec![build(tail, value)]),
        Some((Segment::Key(key), tail)) => {
            let mut map = Map::new();
            map.insert(key.clone(), build(tail, value));
            Value::Object(map)
        }
    }
}

fn push_into(slot: &mut Value, value: Value) {
    match slot {
        Value::Array(items) => items.push(value),
        other => {
            let previous = other.take();
            *other = Value::Array(vec![previous, value]);
        }
    }
}

fn compact_arrays(value: &mut Value) {
    match value {
        Value::Array(items) => items.iter_mut().for_each(compact_arrays),
        Value::Object(map) => {
            map.values_mut().for_each(compact_arrays);

            let indexed = !map.is_empty()
                && map.keys().all(|k| {
                    !k.is_empty()
                        && k.bytes().all(|b| b.is_ascii_digit())
                        && k.parse::<usize>().is_ok_and(|i| i <= MAX_ARRAY_INDEX)
                });

            if indexed {
                let mut entries: Vec<(usize, Value)> = std::mem::take(map)
                    .into_iter()
                    .map(|(k, v)| (k.parse().unwrap_or(MAX_ARRAY_INDEX), v))
                    .collect();
                entries.sort_by_key(|(i, _)| *i);
                *value = Value::Array(entries.into_iter().map(|(_, v)| v).collect());
            }
        }
        _ => {}
    }
}

fn append(serializer: &mut form_urlencoded::Serializer<'_, String>, key: &str, value: &Value) {
    match value {
        Value::Null => {
            serializer.append_pair(key, "");
        }
        Value::Bool(b) => {
            serializer.append_pair(key, if *b { "true" } else { "false" });
        }
        Value::Number(n) => {
            serializer.append_pair(key, &n.to_string());
        }
        Value::String(s) => {
            serializer.append_pair(key, s);
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if item.is_object() || item.is_array() {
                    append(serializer, &format!("{key}[{i}]"), item);
                } else {
                    append(serializer, key, item);
                }
            }
        }
        Value::Object(map) => {
            for (child, item) in map {
                append(serializer, &format!("{key}[{child}]"), item);
            }
        }
    }
}
