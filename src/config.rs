// src/config.rs

//! Runtime configuration
//!
//! There are no configuration files; values come from CLI flags or their
//! environment variable fallbacks and are validated here before use.

use crate::error::{Error, Result};
use std::fmt;
use std::time::Duration;

/// Tooling API version used when none is given
pub const DEFAULT_API_VERSION: &str = "59.0";

/// Default timeout for HTTP requests (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on concurrent dependency fetches
pub const DEFAULT_JOBS: usize = 8;

/// Connection settings for the distribution service
#[derive(Clone)]
pub struct ServiceConfig {
    /// Base URL of the service instance, e.g. `https://example.my.salesforce.com`
    pub instance_url: String,

    /// Bearer token of an already established session
    pub access_token: String,

    pub api_version: String,

    /// Per-request timeout; expiry counts as a failed fetch
    pub timeout: Duration,
}

impl ServiceConfig {
    pub fn new(instance_url: String, access_token: String) -> Self {
        Self {
            instance_url,
            access_token,
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Check that the settings can produce a working client
    pub fn validate(&self) -> Result<()> {
        let url = self.instance_url.trim();
        if url.is_empty() {
            return Err(Error::ConfigError("Instance URL is empty".to_string()));
        }
        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(Error::ConfigError(format!(
                "Instance URL must use http or https: {}",
                url
            )));
        }
        if self.access_token.trim().is_empty() {
            return Err(Error::ConfigError("Access token is empty".to_string()));
        }
        if self.api_version.trim().is_empty() {
            return Err(Error::ConfigError("API version is empty".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(Error::ConfigError("Timeout must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Instance URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.instance_url.trim().trim_end_matches('/')
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .finish()
    }
}
