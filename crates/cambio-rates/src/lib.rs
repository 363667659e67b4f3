//! # cambio-rates: Exchange-Rate Source
//!
//! Obtains the VES-per-USD rate once per session.
//!
//! ## Modules
//!
//! - [`config`] - The `[rates]` configuration section
//! - [`error`] - Rate and configuration error types
//! - [`provider`] - The [`RateProvider`] trait, the HTTP provider and a
//!   fixed provider for offline runs
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cambio_rates::{HttpRateProvider, RateConfig, RateProvider};
//!
//! # async fn run() -> cambio_rates::RateResult<()> {
//! let provider = HttpRateProvider::new(&RateConfig::default())?;
//! match provider.fetch_rate().await {
//!     Ok(rate) => println!("1 USD = {rate} VES"),
//!     Err(e) => eprintln!("using fallback: {e}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod provider;

pub use config::{RateConfig, DEFAULT_ENDPOINT};
pub use error::{RateError, RateResult};
pub use provider::{extract_rate, FixedRateProvider, HttpRateProvider, RateProvider};
