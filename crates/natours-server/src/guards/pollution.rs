use async_trait::async_trait;
use natours_core::{NatoursError, PollutedParams};
use natours_sanitize::normalize_pollution;
use serde_json::Value;

use super::{BodyKind, Exchange, Guard};

/// Keeps only the last value of repeated parameters outside the whitelist
///
/// JSON bodies are left alone since a JSON array is deliberate.
pub struct PollutionGuard {
    whitelist: Vec<String>,
}

impl PollutionGuard {
    pub const fn new(whitelist: Vec<String>) -> Self {
        Self { whitelist }
    }
}

#[async_trait]
impl Guard for PollutionGuard {
    fn name(&self) -> &'static str {
        "parameter_pollution"
    }

    async fn apply(&self, exchange: &mut Exchange) -> Result<(), NatoursError> {
        let mut polluted = PollutedParams {
            query: normalize_pollution(&mut exchange.query, &self.whitelist),
            ..PollutedParams::default()
        };
        if !polluted.query.is_empty() {
            exchange.mark_query_dirty();
        }

        if let Some(parsed) = exchange.parsed.as_mut()
            && parsed.kind == BodyKind::Form
            && let Value::Object(map) = &mut parsed.value
        {
            polluted.body = normalize_pollution(map, &self.whitelist);
            if !polluted.body.is_empty() {
                parsed.mark_dirty();
            }
        }

        exchange.parts.extensions.insert(polluted);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use natours_config::{ByteUnit, ParameterPollutionConfig};
    use serde_json::json;

    use super::super::BodyParser;
    use super::*;

    fn guard() -> PollutionGuard {
        PollutionGuard::new(ParameterPollutionConfig::default().whitelist)
    }

    #[tokio::test]
    async fn last_value_wins_outside_whitelist() {
        let request = http::Request::get("/api/v1/tours?sort=duration&sort=price&duration=5&duration=9")
            .body(Body::empty())
            .unwrap();
        let mut exchange = Exchange::new(request, None);
        guard().apply(&mut exchange).await.unwrap();

        assert_eq!(exchange.query["sort"], json!("price"));
        assert_eq!(exchange.query["duration"], json!(["5", "9"]));

        let polluted = exchange.parts.extensions.get::<PollutedParams>().unwrap();
        assert_eq!(polluted.query["sort"], json!(["duration", "price"]));

        let request = exchange.into_request().unwrap();
        assert_eq!(request.uri(), "/api/v1/tours?sort=price&duration=5&duration=9");
    }

    #[tokio::test]
    async fn form_bodies_are_normalized() {
        let request = http::Request::post("/submit-user-data")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("name=Jonas&name=Lisa"))
            .unwrap();
        let mut exchange = Exchange::new(request, None);
        BodyParser::new(ByteUnit::Kibibyte(10)).apply(&mut exchange).await.unwrap();
        guard().apply(&mut exchange).await.unwrap();

        assert_eq!(exchange.parsed.unwrap().value, json!({"name": "Lisa"}));
    }

    #[tokio::test]
    async fn json_arrays_are_kept() {
        let request = http::Request::post("/api/v1/tours")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"guides":["a","b"]}"#))
            .unwrap();
        let mut exchange = Exchange::new(request, None);
        BodyParser::new(ByteUnit::Kibibyte(10)).apply(&mut exchange).await.unwrap();
        guard().apply(&mut exchange).await.unwrap();

        assert_eq!(exchange.parsed.unwrap().value, json!({"guides": ["a", "b"]}));
        assert!(exchange.parts.extensions.get::<PollutedParams>().unwrap().is_empty());
    }
}
