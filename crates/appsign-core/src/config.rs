//! Configuration for applications embedding the signer and verifier.
//!
//! The signing core itself reads no environment. Callers that want
//! environment-driven settings load a [`SigningConfig`] and hand it to the
//! verifier.

use serde::{Deserialize, Serialize};
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::error::{CoreError, CoreResult};
use crate::time::TimeToLive;

/// Signing and verification settings.
///
/// # Examples
///
/// ```
/// use appsign_core::SigningConfig;
///
/// let config = SigningConfig::builder().ttl_ms(60_000).build();
/// assert_eq!(config.ttl().as_millis(), 60_000);
/// assert_eq!(config.log_level, "info");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct SigningConfig {
    /// Maximum accepted signature age in milliseconds.
    #[builder(default = TimeToLive::DEFAULT.as_millis())]
    pub ttl_ms: u64,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            ttl_ms: TimeToLive::DEFAULT.as_millis(),
            log_level: String::from("info"),
        }
    }
}

impl SigningConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `APPSIGN_TTL_MS` | `30000` |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if `APPSIGN_TTL_MS` is not a non-negative integer.
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("APPSIGN_TTL_MS") {
            config.ttl_ms = v
                .trim()
                .parse()
                .map_err(|_| CoreError::Config(format!("APPSIGN_TTL_MS is not a valid TTL: {v}")))?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        debug!(ttl_ms = config.ttl_ms, log_level = %config.log_level, "Loaded signing config");
        Ok(config)
    }

    /// The configured freshness window.
    #[must_use]
    pub fn ttl(&self) -> TimeToLive {
        TimeToLive::from_millis(self.ttl_ms)
    }
}
