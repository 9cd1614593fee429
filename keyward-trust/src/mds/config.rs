use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// Configuration of the FIDO metadata source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MdsConfig {
    /// Whether metadata is consulted at all.
    pub enabled: bool,

    /// URL of the table of contents token.
    pub source_url: Option<Url>,

    /// Sent as a bearer token with every metadata request.
    pub bearer_token: Option<String>,

    /// How long a successful refresh stays fresh, in milliseconds.
    pub cache_timeout_ms: u64,

    /// Upper bound for each metadata request, in milliseconds.
    pub fetch_timeout_ms: u64,

    /// Upper bound for a whole refresh, table of contents and statements, in milliseconds.
    pub refresh_timeout_ms: u64,

    /// Minimum time between two refreshes forced by an unknown authenticator model, in
    /// milliseconds.
    pub min_refresh_interval_ms: u64,
}

impl Default for MdsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            source_url: None,
            bearer_token: None,
            cache_timeout_ms: 24 * 60 * 60 * 1000,
            fetch_timeout_ms: 10_000,
            refresh_timeout_ms: 30_000,
            min_refresh_interval_ms: 5 * 60 * 1000,
        }
    }
}

impl MdsConfig {
    /// An enabled configuration reading from `source_url`.
    pub fn with_source(source_url: Url) -> Self {
        Self {
            enabled: true,
            source_url: Some(source_url),
            ..Self::default()
        }
    }

    /// How long a successful refresh stays fresh.
    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    /// Upper bound for each metadata request.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Upper bound for a whole refresh.
    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.refresh_timeout_ms)
    }

    /// Minimum time between two forced refreshes.
    pub fn min_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.min_refresh_interval_ms)
    }
}
