use async_trait::async_trait;
use natours_core::NatoursError;
use natours_sanitize::{escape_map, escape_markup, sanitize_keys, sanitize_map};

use super::{Exchange, Guard};

/// Strips query-operator keys (`$gt`, `a.b`) from the query and body
pub struct InjectionSanitizer {
    replace_with: Option<String>,
}

impl InjectionSanitizer {
    pub const fn new(replace_with: Option<String>) -> Self {
        Self { replace_with }
    }
}

#[async_trait]
impl Guard for InjectionSanitizer {
    fn name(&self) -> &'static str {
        "injection_sanitizer"
    }

    async fn apply(&self, exchange: &mut Exchange) -> Result<(), NatoursError> {
        let replace_with = self.replace_with.as_deref();

        if sanitize_map(&mut exchange.query, replace_with) {
            exchange.mark_query_dirty();
        }

        if let Some(parsed) = exchange.parsed.as_mut()
            && sanitize_keys(&mut parsed.value, replace_with)
        {
            tracing::debug!(path = exchange.parts.uri.path(), "removed operator keys from body");
            parsed.mark_dirty();
        }

        Ok(())
    }
}

/// Escapes HTML markup in query and body strings
pub struct MarkupSanitizer;

#[async_trait]
impl Guard for MarkupSanitizer {
    fn name(&self) -> &'static str {
        "markup_sanitizer"
    }

    async fn apply(&self, exchange: &mut Exchange) -> Result<(), NatoursError> {
        if escape_map(&mut exchange.query) {
            exchange.mark_query_dirty();
        }

        if let Some(parsed) = exchange.parsed.as_mut()
            && escape_markup(&mut parsed.value)
        {
            parsed.mark_dirty();
        }

        Ok(())
    }
}
