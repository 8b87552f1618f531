use std::time::Duration;

use serde::Deserialize;

/// Cross-origin resource sharing policy
///
/// The default mirrors the reference deployment: every origin is accepted
/// and credentialed requests are allowed. Browsers refuse a literal `*`
/// together with credentials, so that combination is served by echoing the
/// request origin back.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Allowed origins (wildcard "*" or explicit list)
    #[serde(default)]
    pub origins: AnyOrArray,
    /// Allowed HTTP methods (wildcard "*" or explicit list)
    #[serde(default = "default_methods")]
    pub methods: AnyOrArray,
    /// Allowed request headers (wildcard "*" or explicit list)
    #[serde(default)]
    pub headers: AnyOrArray,
    /// Headers to expose to the browser
    #[serde(default)]
    pub expose_headers: Vec<String>,
    /// Allow cookies and authorization headers on cross-origin requests
    #[serde(default = "default_credentials")]
    pub credentials: bool,
    /// Max age for preflight cache in seconds
    #[serde(default)]
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            origins: AnyOrArray::Any,
            methods: default_methods(),
            headers: AnyOrArray::Any,
            expose_headers: Vec::new(),
            credentials: true,
            max_age: None,
        }
    }
}

impl CorsConfig {
    /// Get max age as Duration
    pub fn max_age_duration(&self) -> Option<Duration> {
        self.max_age.map(Duration::from_secs)
    }

    /// Whether any origin is accepted while credentials are allowed
    pub const fn is_credentialed_wildcard(&self) -> bool {
        self.credentials && matches!(self.origins, AnyOrArray::Any)
    }
}

/// Either a wildcard "*" or explicit list of values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AnyOrArray {
    /// Match any value
    #[default]
    Any,
    /// Explicit list
    List(Vec<String>),
}

impl AnyOrArray {
    /// Whether the value is allowed by this list (exact match)
    pub fn allows(&self, value: &str) -> bool {
        match self {
            Self::Any => true,
            Self::List(values) => values.iter().any(|v| v == value),
        }
    }
}

impl<'de> Deserialize<'de> for AnyOrArray {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de;

        struct AnyOrArrayVisitor;

        impl<'de> de::Visitor<'de> for AnyOrArrayVisitor {
            type Value = AnyOrArray;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("\"*\" or array of strings")
            }

            fn visit_str<E>(self, v: &str) -> Result<AnyOrArray, E>
            where
                E: de::Error,
            {
                if v == "*" {
                    Ok(AnyOrArray::Any)
                } else {
                    Ok(AnyOrArray::List(vec![v.to_string()]))
                }
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<AnyOrArray, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut values = Vec::new();
                while let Some(val) = seq.next_element::<String>()? {
                    if val == "*" {
                        return Ok(AnyOrArray::Any);
                    }
                    values.push(val);
                }
                Ok(AnyOrArray::List(values))
            }
        }

        deserializer.deserialize_any(AnyOrArrayVisitor)
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_enabled() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_credentials() -> bool {
    true
}

fn default_methods() -> AnyOrArray {
    AnyOrArray::List(
        ["GET", "HEAD", "PUT", "PATCH", "POST", "DELETE"]
            .into_iter()
            .map(str::to_owned)
            .collect(),
    )
}
