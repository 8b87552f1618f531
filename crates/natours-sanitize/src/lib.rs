//! Transformers over parsed request data
//!
//! Query strings and form bodies are parsed into JSON values with
//! bracket nesting (`price[gte]=500` becomes `{"price": {"gte": "500"}}`), then
//! run through the injection sanitizer, the markup sanitizer and the
//! parameter-pollution normalizer. Each transformer is idempotent.

pub mod injection;
pub mod markup;
pub mod pollution;
pub mod query;

pub use injection::{sanitize_keys, sanitize_map};
pub use markup::{escape_map, escape_markup};
pub use pollution::normalize_pollution;
pub use query::{encode_nested, parse_nested};
