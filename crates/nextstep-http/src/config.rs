//! Client configuration.

use std::time::Duration;

use nextstep_core::error::InvalidInputError;
use nextstep_core::{ApiUrl, Result};

/// Base URL used when none is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable overriding the base URL.
pub const API_URL_VAR: &str = "NEXTSTEP_API_URL";

/// Environment variable overriding the timeout, in whole seconds.
pub const TIMEOUT_VAR: &str = "NEXTSTEP_TIMEOUT_SECS";

/// Settings for the HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: ApiUrl,
    pub timeout: Duration,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: ApiUrl) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("nextstep-http/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, falling back to defaults for
    /// unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = match lookup(API_URL_VAR) {
            Some(url) => ApiUrl::new(url.trim())?,
            None => ApiUrl::new(DEFAULT_API_URL)?,
        };

        let mut config = Self::new(base_url);
        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs: u64 = raw.trim().parse().map_err(|_| InvalidInputError::Other {
                message: format!("{TIMEOUT_VAR} must be a whole number of seconds, got '{raw}'"),
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}
