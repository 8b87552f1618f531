use serde::Deserialize;

/// How the client identity used for rate limiting is derived
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientIpConfig {
    /// Number of trusted proxy hops in front of the server
    ///
    /// When set, the address is read from `X-Forwarded-For` counting this
    /// many entries from the right. When unset the socket peer address is used.
    #[serde(default)]
    pub trusted_hops: Option<usize>,
}
