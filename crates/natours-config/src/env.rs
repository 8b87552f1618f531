use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Substitute `{{ env.NAME }}` placeholders in raw config text
///
/// A fallback may be given with `{{ env.NAME | default("value") }}`. Lines
/// whose first non-blank character is `#` are copied verbatim so commented
/// out settings never require their variables to exist.
pub fn expand_env(input: &str) -> Result<String, String> {
    fn placeholder() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| {
            Regex::new(r#"\{\{\s*([A-Za-z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#)
                .expect("placeholder pattern is valid")
        })
    }

    let mut lines = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_owned());
            continue;
        }

        let mut failure = None;
        let expanded = placeholder().replace_all(line, |caps: &Captures<'_>| {
            let key = &caps[1];
            let fallback = caps.get(2).map(|m| m.as_str());

            match resolve(key, fallback) {
                Ok(value) => value,
                Err(e) => {
                    failure.get_or_insert(e);
                    String::new()
                }
            }
        });

        if let Some(e) = failure {
            return Err(e);
        }
        lines.push(expanded.into_owned());
    }

    let mut output = lines.join("\n");
    if input.ends_with('\n') {
        output.push('\n');
    }

    Ok(output)
}

fn resolve(key: &str, fallback: Option<&str>) -> Result<String, String> {
    let Some(name) = key.strip_prefix("env.").filter(|n| !n.contains('.')) else {
        return Err(format!("only variables scoped with 'env.' are supported: `{key}`"));
    };

    match (std::env::var(name), fallback) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(default)) => Ok(default.to_owned()),
        (Err(_), None) => Err(format!("environment variable not found: `{name}`")),
    }
}
