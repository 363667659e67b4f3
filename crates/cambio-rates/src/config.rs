//! # Rate Source Configuration
//!
//! The `[rates]` section of `cambio.toml`.
//!
//! ## Configuration File Format
//! ```toml
//! [rates]
//! enabled = true
//! endpoint = "https://api.exchangerate-api.com/v4/latest/USD"
//! quote_currency = "VES"   # key looked up under "rates" in the response
//! timeout_secs = 10
//! ```

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{RateError, RateResult};

/// Public endpoint returning `{"rates": {"VES": <number>, ...}}` for USD.
pub const DEFAULT_ENDPOINT: &str = "https://api.exchangerate-api.com/v4/latest/USD";

/// Where and how to fetch the exchange rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateConfig {
    /// Set to false to skip the request and run on the fallback rate.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// URL answered with the rates JSON.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Key under `rates` holding VES per USD.
    #[serde(default = "default_quote_currency")]
    pub quote_currency: String,

    /// Upper bound for the whole request, headers and body included.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_quote_currency() -> String {
    "VES".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for RateConfig {
    fn default() -> Self {
        RateConfig {
            enabled: default_enabled(),
            endpoint: default_endpoint(),
            quote_currency: default_quote_currency(),
            timeout_secs: default_timeout(),
        }
    }
}

impl RateConfig {
    /// Validates the section.
    pub fn validate(&self) -> RateResult<()> {
        let url = Url::parse(&self.endpoint)
            .map_err(|e| RateError::InvalidConfig(format!("endpoint '{}': {}", self.endpoint, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(RateError::InvalidConfig(format!(
                "endpoint must start with http:// or https://, got: {}",
                self.endpoint
            )));
        }

        if self.quote_currency.trim().is_empty() {
            return Err(RateError::InvalidConfig(
                "quote_currency must not be empty".into(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(RateError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateConfig::default();
        assert!(config.enabled);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.quote_currency, "VES");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = RateConfig {
            endpoint: "ftp://rates.example.com".into(),
            ..RateConfig::default()
        };
        assert!(config.validate().is_err());

        config.endpoint = "not a url".into();
        assert!(config.validate().is_err());

        config.endpoint = "http://localhost:8080/latest".into();
        assert!(config.validate().is_ok());

        config.quote_currency = "  ".into();
        assert!(config.validate().is_err());

        config.quote_currency = "VES".into();
        config.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(RateError::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let config: RateConfig = toml::from_str("timeout_secs = 3").unwrap();
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(config.enabled);
    }
}
