use serde::Deserialize;

/// Input sanitization applied to parsed query strings and bodies
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SanitizeConfig {
    /// Strip query-operator keys (`$` prefix or `.` inside a key)
    #[serde(default = "default_true")]
    pub injection: bool,
    /// Replace offending characters with this string instead of removing the key
    #[serde(default)]
    pub replace_with: Option<String>,
    /// Escape markup in string values
    #[serde(default = "default_true")]
    pub markup: bool,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            injection: true,
            replace_with: None,
            markup: true,
        }
    }
}

impl SanitizeConfig {
    /// Ensure the replacement does not reintroduce the characters it replaces
    ///
    /// # Errors
    ///
    /// Returns an error if `replace_with` contains `$` or `.`
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(ref replacement) = self.replace_with
            && replacement.contains(['$', '.'])
        {
            anyhow::bail!("sanitize.replace_with must not contain '$' or '.'");
        }
        Ok(())
    }
}

/// Duplicate parameter handling
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterPollutionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Fields allowed to carry several values
    #[serde(default = "default_whitelist")]
    pub whitelist: Vec<String>,
}

impl Default for ParameterPollutionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            whitelist: default_whitelist(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_true() -> bool {
    true
}

fn default_whitelist() -> Vec<String> {
    ["duration", "ratingsQuantity", "ratingsAverage", "maxGroupSize", "difficulty", "prize"]
        .into_iter()
        .map(str::to_owned)
        .collect()
}
