use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let config = Self::parse(&raw)?;
        tracing::debug!(path = %path.display(), environment = %config.server.environment, "configuration loaded");
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if the rate limit, body limit, sanitizer, or
    /// security header settings are unusable
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_rate_limit()?;
        self.validate_body_limit()?;
        self.server.sanitize.validate()?;
        self.server.security_headers.validate()?;
        self.validate_telemetry()?;
        Ok(())
    }

    fn validate_rate_limit(&self) -> anyhow::Result<()> {
        let rate_limit = &self.server.rate_limit;
        if !rate_limit.enabled {
            return Ok(());
        }

        if rate_limit.requests == 0 {
            anyhow::bail!("server.rate_limit.requests must be greater than 0");
        }

        rate_limit.window_duration()?;

        if !rate_limit.path_prefix.starts_with('/') {
            anyhow::bail!("server.rate_limit.path_prefix must start with '/'");
        }

        Ok(())
    }

    fn validate_body_limit(&self) -> anyhow::Result<()> {
        if self.server.body_limit.as_u64() == 0 {
            anyhow::bail!("server.body_limit must be greater than 0");
        }
        Ok(())
    }

    fn validate_telemetry(&self) -> anyhow::Result<()> {
        if let Some(ref telemetry) = self.telemetry
            && !(0.0..=1.0).contains(&telemetry.sampling_rate)
        {
            anyhow::bail!("telemetry.sampling_rate must be between 0.0 and 1.0");
        }
        Ok(())
    }
}
