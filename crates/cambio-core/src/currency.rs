//! # Currency Module
//!
//! The two currencies a budget is priced in, the exchange rate between them,
//! and the percentage markup applied to the grand total.
//!
//! ## Conversion Direction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   USD ──── × rate ────► VES          rate = VES per 1 USD               │
//! │   USD ◄─── ÷ rate ───── VES          (0 when rate is not positive)      │
//! │                                                                         │
//! │   Whichever side the user typed is authoritative; the other side is     │
//! │   derived once, at the moment the item is created or edited.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cambio_core::currency::{ExchangeRate, Markup};
//!
//! let rate = ExchangeRate::new(40.0).unwrap();
//! assert_eq!(rate.usd_to_ves(3.0), 120.0);
//! assert_eq!(rate.ves_to_usd(80.0), 2.0);
//!
//! let markup = Markup::parse("10");
//! assert!((markup.apply(8.0) - 8.8).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::DEFAULT_FALLBACK_RATE;

// =============================================================================
// Currency
// =============================================================================

/// A currency a price can be entered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US dollar.
    Usd,
    /// Venezuelan bolívar.
    Ves,
}

impl Currency {
    /// ISO 4217 code.
    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Ves => "VES",
        }
    }

    /// The other currency of the pair.
    pub const fn counterpart(&self) -> Currency {
        match self {
            Currency::Usd => Currency::Ves,
            Currency::Ves => Currency::Usd,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// Exchange Rate
// =============================================================================

/// VES per USD. Always finite and strictly positive once constructed.
///
/// ## Why a newtype?
/// The rate arrives from an external source as a bare number that may be
/// zero, negative or NaN. [`ExchangeRate::new`] is the single gate those
/// values pass through; everything downstream can divide by it safely.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExchangeRate(f64);

impl ExchangeRate {
    /// The built-in fallback rate (36.00 VES per USD).
    pub const FALLBACK: ExchangeRate = ExchangeRate(DEFAULT_FALLBACK_RATE);

    /// Accepts `value` if it is finite and greater than zero.
    ///
    /// ## Example
    /// ```rust
    /// use cambio_core::currency::ExchangeRate;
    ///
    /// assert!(ExchangeRate::new(36.5).is_some());
    /// assert!(ExchangeRate::new(0.0).is_none());
    /// assert!(ExchangeRate::new(-1.0).is_none());
    /// assert!(ExchangeRate::new(f64::NAN).is_none());
    /// ```
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && value > 0.0 {
            Some(ExchangeRate(value))
        } else {
            None
        }
    }

    /// Returns the raw VES-per-USD value.
    #[inline]
    pub const fn value(&self) -> f64 {
        self.0
    }

    /// Converts a USD amount to VES.
    #[inline]
    pub fn usd_to_ves(&self, usd: f64) -> f64 {
        usd * self.0
    }

    /// Converts a VES amount to USD.
    #[inline]
    pub fn ves_to_usd(&self, ves: f64) -> f64 {
        ves_to_usd(ves, self.0)
    }

    /// Converts `amount` expressed in `from` into the other currency.
    pub fn convert(&self, amount: f64, from: Currency) -> f64 {
        match from {
            Currency::Usd => self.usd_to_ves(amount),
            Currency::Ves => self.ves_to_usd(amount),
        }
    }
}

impl Default for ExchangeRate {
    fn default() -> Self {
        ExchangeRate::FALLBACK
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} VES/USD", self.0)
    }
}

/// Divides a VES amount by a raw rate, yielding 0 instead of dividing by a
/// non-positive rate.
pub fn ves_to_usd(ves: f64, rate: f64) -> f64 {
    if rate > 0.0 {
        ves / rate
    } else {
        0.0
    }
}

// =============================================================================
// Markup
// =============================================================================

/// Percentage added on top of the grand total to produce the final total.
///
/// Invalid input never fails: it becomes a 0% markup. Negative percentages
/// are accepted and act as a discount.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Markup(f64);

impl Markup {
    /// No markup.
    pub const NONE: Markup = Markup(0.0);

    /// Creates a markup from a percentage, treating non-finite values as 0.
    pub fn from_percent(percent: f64) -> Self {
        if percent.is_finite() {
            Markup(percent)
        } else {
            Markup::NONE
        }
    }

    /// Parses user-typed percentage text. Empty or non-numeric text is 0.
    ///
    /// ## Example
    /// ```rust
    /// use cambio_core::currency::Markup;
    ///
    /// assert_eq!(Markup::parse(" 15 ").percent(), 15.0);
    /// assert_eq!(Markup::parse("").percent(), 0.0);
    /// assert_eq!(Markup::parse("abc").percent(), 0.0);
    /// ```
    pub fn parse(text: &str) -> Self {
        text.trim()
            .parse::<f64>()
            .map(Markup::from_percent)
            .unwrap_or(Markup::NONE)
    }

    /// Returns the percentage (10.0 means 10%).
    #[inline]
    pub const fn percent(&self) -> f64 {
        self.0
    }

    /// Multiplier applied to totals: `1 + percent / 100`.
    #[inline]
    pub fn multiplier(&self) -> f64 {
        1.0 + self.0 / 100.0
    }

    /// Applies the markup to an amount.
    #[inline]
    pub fn apply(&self, amount: f64) -> f64 {
        amount * self.multiplier()
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_rate_rejects_invalid_values() {
        assert!(ExchangeRate::new(0.0).is_none());
        assert!(ExchangeRate::new(-3.5).is_none());
        assert!(ExchangeRate::new(f64::NAN).is_none());
        assert!(ExchangeRate::new(f64::INFINITY).is_none());
        assert_eq!(ExchangeRate::new(36.5).map(|r| r.value()), Some(36.5));
    }

    #[test]
    fn test_default_rate_is_fallback() {
        assert_eq!(ExchangeRate::default().value(), 36.0);
    }

    #[test]
    fn test_usd_ves_round_trip() {
        for rate in [0.01, 1.0, 36.0, 40.0, 36.71, 1234.5678] {
            let rate = ExchangeRate::new(rate).unwrap();
            for usd in [0.0, 0.01, 1.0, 3.0, 19.99, 1_000_000.0] {
                let back = rate.ves_to_usd(rate.usd_to_ves(usd));
                assert!(
                    (back - usd).abs() <= EPSILON * usd.max(1.0),
                    "{usd} via {rate} came back as {back}"
                );
            }
        }
    }

    #[test]
    fn test_ves_to_usd_with_zero_rate_is_zero() {
        assert_eq!(ves_to_usd(80.0, 0.0), 0.0);
        assert_eq!(ves_to_usd(80.0, -2.0), 0.0);
    }

    #[test]
    fn test_convert_by_direction() {
        let rate = ExchangeRate::new(40.0).unwrap();
        assert_eq!(rate.convert(3.0, Currency::Usd), 120.0);
        assert_eq!(rate.convert(80.0, Currency::Ves), 2.0);
        assert_eq!(Currency::Usd.counterpart(), Currency::Ves);
    }

    #[test]
    fn test_markup_apply() {
        assert!((Markup::from_percent(10.0).apply(8.0) - 8.8).abs() < EPSILON);
        assert_eq!(Markup::NONE.apply(8.0), 8.0);
        assert!((Markup::from_percent(-50.0).apply(8.0) - 4.0).abs() < EPSILON);
    }

    #[test]
    fn test_markup_invalid_is_zero() {
        assert_eq!(Markup::from_percent(f64::NAN), Markup::NONE);
        assert_eq!(Markup::parse("ten"), Markup::NONE);
        assert_eq!(Markup::parse("   "), Markup::NONE);
        assert_eq!(Markup::parse("inf"), Markup::NONE);
    }

    #[test]
    fn test_display() {
        assert_eq!(Currency::Ves.to_string(), "VES");
        assert_eq!(ExchangeRate::new(36.5).unwrap().to_string(), "36.50 VES/USD");
        assert_eq!(Markup::from_percent(12.5).to_string(), "12.5%");
    }
}
