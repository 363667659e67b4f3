//! # Rate Providers
//!
//! Sources for the session's VES-per-USD rate.
//!
//! ## Fetch Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     HttpRateProvider::fetch_rate                        │
//! │                                                                         │
//! │  GET endpoint ──┬── no answer in time ────────► RateError::Timeout      │
//! │                 ├── connection error ─────────► RateError::Request      │
//! │                 ├── status not 2xx ───────────► RateError::Status       │
//! │                 ▼                                                       │
//! │  body ──────────┬── not JSON ─────────────────► RateError::MalformedBody│
//! │                 ▼                                                       │
//! │  rates.<QUOTE> ─┬── absent ───────────────────► RateError::MissingField │
//! │                 ├── not a number ─────────────► RateError::NotNumeric   │
//! │                 ├── ≤ 0 or not finite ────────► RateError::InvalidRate  │
//! │                 ▼                                                       │
//! │               Ok(rate)                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use reqwest::header::ACCEPT;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::RateConfig;
use crate::error::{RateError, RateResult};

// =============================================================================
// Provider Trait
// =============================================================================

/// Anything that can produce the exchange rate once.
pub trait RateProvider: Send + Sync {
    /// Fetches VES per USD.
    fn fetch_rate(&self) -> impl Future<Output = RateResult<f64>> + Send;
}

// =============================================================================
// HTTP Provider
// =============================================================================

/// Fetches the rate with a single HTTP GET.
pub struct HttpRateProvider {
    client: reqwest::Client,
    endpoint: String,
    quote_currency: String,
    timeout: Duration,
}

impl HttpRateProvider {
    /// Creates a provider from a validated `[rates]` section.
    pub fn new(config: &RateConfig) -> RateResult<Self> {
        config.validate()?;

        Ok(HttpRateProvider {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            quote_currency: config.quote_currency.clone(),
            timeout: config.timeout(),
        })
    }

    /// Overrides the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn request(&self) -> RateResult<f64> {
        debug!(endpoint = %self.endpoint, "Requesting exchange rate");

        let response = self
            .client
            .get(&self.endpoint)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        // Handle non-2xx response codes
        let status = response.status();
        if !status.is_success() {
            return Err(RateError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let json: Value =
            serde_json::from_str(&body).map_err(|e| RateError::MalformedBody(e.to_string()))?;

        extract_rate(&json, &self.quote_currency)
    }
}

impl RateProvider for HttpRateProvider {
    async fn fetch_rate(&self) -> RateResult<f64> {
        let result = match tokio::time::timeout(self.timeout, self.request()).await {
            Ok(result) => result,
            Err(_) => Err(RateError::Timeout {
                millis: self.timeout.as_millis() as u64,
            }),
        };

        match &result {
            Ok(rate) => debug!(rate, "Exchange rate received"),
            Err(e) => warn!(error = %e, endpoint = %self.endpoint, "Exchange rate fetch failed"),
        }
        result
    }
}

/// Reads `rates.<quote>` from a rates response.
///
/// Numeric strings are accepted as well as JSON numbers.
///
/// ## Example
/// ```rust
/// use cambio_rates::extract_rate;
/// use serde_json::json;
///
/// let body = json!({"base": "USD", "rates": {"VES": 36.5, "EUR": 0.92}});
/// assert_eq!(extract_rate(&body, "VES").unwrap(), 36.5);
/// assert!(extract_rate(&body, "COP").is_err());
/// ```
pub fn extract_rate(json: &Value, quote: &str) -> RateResult<f64> {
    let field = json
        .get("rates")
        .and_then(|rates| rates.get(quote))
        .filter(|value| !value.is_null())
        .ok_or_else(|| RateError::MissingField(quote.to_string()))?;

    let rate = match field {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| RateError::NotNumeric {
        field: quote.to_string(),
        value: field.to_string(),
    })?;

    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(RateError::InvalidRate(rate))
    }
}

// =============================================================================
// Fixed Provider
// =============================================================================

/// Returns a preset outcome without any I/O.
///
/// Used when fetching is disabled and in tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRateProvider {
    rate: Option<f64>,
}

impl FixedRateProvider {
    /// Always answers with `rate` (still checked like a fetched value).
    pub fn rate(rate: f64) -> Self {
        FixedRateProvider { rate: Some(rate) }
    }

    /// Always fails with [`RateError::Disabled`].
    pub fn unavailable() -> Self {
        FixedRateProvider { rate: None }
    }
}

impl RateProvider for FixedRateProvider {
    async fn fetch_rate(&self) -> RateResult<f64> {
        match self.rate {
            Some(rate) if rate.is_finite() && rate > 0.0 => Ok(rate),
            Some(rate) => Err(RateError::InvalidRate(rate)),
            None => Err(RateError::Disabled),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response and returns the endpoint URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let mut read = 0;
            while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf[read..]).await.unwrap();
                if n == 0 {
                    break;
                }
                read += n;
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}/v4/latest/USD", addr)
    }

    fn provider_for(endpoint: String) -> HttpRateProvider {
        let config = RateConfig {
            endpoint,
            ..RateConfig::default()
        };
        HttpRateProvider::new(&config).unwrap()
    }

    #[test]
    fn test_extract_rate() {
        let body = json!({"rates": {"VES": 40.0}});
        assert_eq!(extract_rate(&body, "VES").unwrap(), 40.0);

        let body = json!({"rates": {"VES": "39.75"}});
        assert_eq!(extract_rate(&body, "VES").unwrap(), 39.75);
    }

    #[test]
    fn test_extract_rate_failures() {
        assert!(matches!(
            extract_rate(&json!({"base": "USD"}), "VES"),
            Err(RateError::MissingField(_))
        ));
        assert!(matches!(
            extract_rate(&json!({"rates": {"VES": null}}), "VES"),
            Err(RateError::MissingField(_))
        ));
        assert!(matches!(
            extract_rate(&json!({"rates": {"VES": "abc"}}), "VES"),
            Err(RateError::NotNumeric { .. })
        ));
        assert!(matches!(
            extract_rate(&json!({"rates": {"VES": [1]}}), "VES"),
            Err(RateError::NotNumeric { .. })
        ));
        assert!(matches!(
            extract_rate(&json!({"rates": {"VES": 0}}), "VES"),
            Err(RateError::InvalidRate(_))
        ));
        assert!(matches!(
            extract_rate(&json!({"rates": {"VES": -3.2}}), "VES"),
            Err(RateError::InvalidRate(_))
        ));
    }

    #[test]
    fn test_provider_rejects_invalid_config() {
        let config = RateConfig {
            timeout_secs: 0,
            ..RateConfig::default()
        };
        assert!(HttpRateProvider::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_fetch_rate_success() {
        let endpoint = serve_once("200 OK", r#"{"base":"USD","rates":{"EUR":0.92,"VES":36.71}}"#).await;
        let rate = provider_for(endpoint).fetch_rate().await.unwrap();
        assert_eq!(rate, 36.71);
    }

    #[tokio::test]
    async fn test_fetch_rate_http_error() {
        let endpoint = serve_once("503 Service Unavailable", r#"{"error":"down"}"#).await;
        let err = provider_for(endpoint).fetch_rate().await.unwrap_err();
        assert!(matches!(err, RateError::Status(503)));
    }

    #[tokio::test]
    async fn test_fetch_rate_malformed_body() {
        let endpoint = serve_once("200 OK", "<html>oops</html>").await;
        let err = provider_for(endpoint).fetch_rate().await.unwrap_err();
        assert!(matches!(err, RateError::MalformedBody(_)));
    }

    #[tokio::test]
    async fn test_fetch_rate_missing_field() {
        let endpoint = serve_once("200 OK", r#"{"rates":{"EUR":0.92}}"#).await;
        let err = provider_for(endpoint).fetch_rate().await.unwrap_err();
        assert!(matches!(err, RateError::MissingField(ref q) if q == "VES"));
    }

    #[tokio::test]
    async fn test_fetch_rate_connection_refused() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = provider_for(format!("http://{}/", addr))
            .fetch_rate()
            .await
            .unwrap_err();
        assert!(matches!(err, RateError::Request(_)));
    }

    #[tokio::test]
    async fn test_fetch_rate_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and never answer.
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let err = provider_for(format!("http://{}/", addr))
            .with_timeout(Duration::from_millis(200))
            .fetch_rate()
            .await
            .unwrap_err();
        assert!(matches!(err, RateError::Timeout { millis: 200 }));
    }

    #[tokio::test]
    async fn test_fixed_provider() {
        assert_eq!(FixedRateProvider::rate(40.0).fetch_rate().await.unwrap(), 40.0);
        assert!(matches!(
            FixedRateProvider::rate(0.0).fetch_rate().await,
            Err(RateError::InvalidRate(_))
        ));
        assert!(matches!(
            FixedRateProvider::unavailable().fetch_rate().await,
            Err(RateError::Disabled)
        ));
    }
}
