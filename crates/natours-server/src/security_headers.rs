use std::sync::Arc;

use anyhow::Context;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use natours_config::SecurityHeadersConfig;

/// Protective headers computed once at startup
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    headers: HeaderMap,
}

impl SecurityHeaders {
    /// Render the header set from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configured value is not a valid header value
    pub fn from_config(config: &SecurityHeadersConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();

        let policy = config.content_security_policy_header();
        if !policy.is_empty() {
            headers.insert(
                header::CONTENT_SECURITY_POLICY,
                HeaderValue::from_str(&policy).context("invalid content security policy")?,
            );
        }

        let fixed: [(&str, &str); 9] = [
            ("cross-origin-opener-policy", "same-origin"),
            ("cross-origin-resource-policy", "same-origin"),
            ("origin-agent-cluster", "?1"),
            ("referrer-policy", "no-referrer"),
            ("x-content-type-options", "nosniff"),
            ("x-dns-prefetch-control", "off"),
            ("x-download-options", "noopen"),
            ("x-permitted-cross-domain-policies", "none"),
            ("x-xss-protection", "0"),
        ];
        for (name, value) in fixed {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }

        headers.insert(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_str(&config.frame_options).context("invalid frame options")?,
        );

        if config.hsts_max_age > 0 {
            let value = format!("max-age={}; includeSubDomains", config.hsts_max_age);
            headers.insert(header::STRICT_TRANSPORT_SECURITY, HeaderValue::from_str(&value)?);
        }

        Ok(Self { headers })
    }

    /// Add every header the response does not already carry
    pub fn apply(&self, response: &mut Response) {
        let target = response.headers_mut();
        for (name, value) in &self.headers {
            if !target.contains_key(name) {
                target.insert(name.clone(), value.clone());
            }
        }
    }
}

pub async fn security_headers_middleware(headers: Arc<SecurityHeaders>, request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    headers.apply(&mut response);
    response
}
