use indexmap::IndexMap;
use serde::Deserialize;

/// Directives whose allow-lists must include the service origin for the
/// hosted payment checkout to load
pub const PAYMENT_DIRECTIVES: [&str; 3] = ["script-src", "connect-src", "frame-src"];

/// Protective response headers
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityHeadersConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Content-Security-Policy directives in emission order
    #[serde(default = "default_content_security_policy")]
    pub content_security_policy: IndexMap<String, Vec<String>>,
    /// Value of `X-Frame-Options`
    #[serde(default = "default_frame_options")]
    pub frame_options: String,
    /// `Strict-Transport-Security` max-age in seconds, `0` disables the header
    #[serde(default = "default_hsts_max_age")]
    pub hsts_max_age: u64,
}

impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            content_security_policy: default_content_security_policy(),
            frame_options: default_frame_options(),
            hsts_max_age: default_hsts_max_age(),
        }
    }
}

impl SecurityHeadersConfig {
    /// Render the policy as a header value
    pub fn content_security_policy_header(&self) -> String {
        self.content_security_policy
            .iter()
            .map(|(directive, sources)| {
                if sources.is_empty() {
                    directive.clone()
                } else {
                    format!("{directive} {}", sources.join(" "))
                }
            })
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Ensure the payment-critical directives allow the service's own origin
    ///
    /// # Errors
    ///
    /// Returns an error naming the first directive that lacks `'self'`
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.enabled {
            return Ok(());
        }

        for directive in PAYMENT_DIRECTIVES {
            let Some(sources) = self.content_security_policy.get(directive) else {
                continue;
            };
            if !sources.iter().any(|s| s == "'self'") {
                anyhow::bail!("content security policy directive '{directive}' must include 'self'");
            }
        }

        Ok(())
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_enabled() -> bool {
    true
}

fn default_frame_options() -> String {
    "SAMEORIGIN".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_hsts_max_age() -> u64 {
    15_552_000
}

fn default_content_security_policy() -> IndexMap<String, Vec<String>> {
    let directives: [(&str, &[&str]); 13] = [
        ("default-src", &["'self'"]),
        (
            "script-src",
            &["'self'", "https://cdnjs.cloudflare.com", "https://js.stripe.com"],
        ),
        (
            "connect-src",
            &[
                "'self'",
                "http://127.0.0.1:3000",
                "https://js.stripe.com",
                "https://api.stripe.com",
                "https://checkout.stripe.com",
            ],
        ),
        (
            "frame-src",
            &["'self'", "https://js.stripe.com", "https://checkout.stripe.com"],
        ),
        ("base-uri", &["'self'"]),
        ("font-src", &["'self'", "https:", "data:"]),
        ("form-action", &["'self'"]),
        ("frame-ancestors", &["'self'"]),
        ("img-src", &["'self'", "data:"]),
        ("object-src", &["'none'"]),
        ("script-src-attr", &["'none'"]),
        ("style-src", &["'self'", "https:", "'unsafe-inline'"]),
        ("upgrade-insecure-requests", &[]),
    ];

    directives
        .into_iter()
        .map(|(name, sources)| {
            (
                name.to_owned(),
                sources.iter().map(|s| (*s).to_owned()).collect(),
            )
        })
        .collect()
}
