//! # Rate Error Types
//!
//! Everything that can go wrong while obtaining the exchange rate.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Rate Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Response            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Request        │  │  MalformedBody          │ │
//! │  │                 │  │  Timeout        │  │  MissingField           │ │
//! │  │                 │  │  Status         │  │  NotNumeric             │ │
//! │  │                 │  │  Disabled       │  │  InvalidRate            │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  None of these reach the user as a failure: a rate error means the     │
//! │  session runs on the fallback rate.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for rate operations.
pub type RateResult<T> = Result<T, RateError>;

/// Rate source errors.
#[derive(Debug, Error)]
pub enum RateError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The HTTP request could not be completed.
    #[error("Rate request failed: {0}")]
    Request(String),

    /// No complete response within the configured timeout.
    #[error("Rate request timed out after {millis} ms")]
    Timeout { millis: u64 },

    /// The server answered with a non-2xx status.
    #[error("Rate source returned HTTP {0}")]
    Status(u16),

    /// Fetching is turned off in the configuration.
    #[error("Rate fetching is disabled")]
    Disabled,

    // =========================================================================
    // Response Errors
    // =========================================================================
    /// The body is not valid JSON.
    #[error("Malformed rate response: {0}")]
    MalformedBody(String),

    /// The JSON has no `rates.<quote>` field.
    #[error("Rate response has no field rates.{0}")]
    MissingField(String),

    /// The rate field is present but not a number.
    #[error("Rate field rates.{field} is not a number: {value}")]
    NotNumeric { field: String, value: String },

    /// The rate is a number but zero, negative or not finite.
    #[error("Rate {0} is not a positive number")]
    InvalidRate(f64),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for RateError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => RateError::Status(status.as_u16()),
            None => RateError::Request(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(RateError::Status(503).to_string(), "Rate source returned HTTP 503");
        assert_eq!(
            RateError::MissingField("VES".into()).to_string(),
            "Rate response has no field rates.VES"
        );
        assert_eq!(
            RateError::Timeout { millis: 1500 }.to_string(),
            "Rate request timed out after 1500 ms"
        );
    }

    #[test]
    fn test_invalid_config_message() {
        assert_eq!(
            RateError::InvalidConfig("timeout_secs must be greater than 0".into()).to_string(),
            "Invalid configuration: timeout_secs must be greater than 0"
        );
    }
}
