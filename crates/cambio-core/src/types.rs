//! # Domain Types
//!
//! Core domain types used throughout Cambio.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Budget Session                                  │
//! │                                                                         │
//! │   uncommitted items                 partial totals                      │
//! │   ┌────────────┐                    ┌──────────────────────────────┐   │
//! │   │ LineItem   │ ── commit ───────► │ PartialTotal "Groceries"     │   │
//! │   │ LineItem   │   (moved, list     │   ├── LineItem               │   │
//! │   └────────────┘    emptied)        │   └── LineItem               │   │
//! │                                     └──────────────────────────────┘   │
//! │                                                                         │
//! │   Aggregates = uncommitted subtotal + Σ partial totals (+ markup)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Ids come from a per-engine monotonic counter, so they increase with
//! creation order and never collide, however quickly items are created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::currency::{Currency, ExchangeRate, Markup};
use crate::validation::ValidatedItem;

// =============================================================================
// Identifiers
// =============================================================================

/// Identifier of a line item, unique within one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemId(pub u32);

/// Identifier of a partial total, unique within one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PartialTotalId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PartialTotalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an item lives: the uncommitted list or inside a partial total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "partialTotalId", rename_all = "snake_case")]
pub enum ItemScope {
    /// The list of items not yet grouped into a partial total.
    #[default]
    Uncommitted,
    /// The items of the given partial total.
    Partial(PartialTotalId),
}

impl fmt::Display for ItemScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemScope::Uncommitted => f.write_str("current budget"),
            ItemScope::Partial(id) => write!(f, "partial total {}", id),
        }
    }
}

// =============================================================================
// Price Input
// =============================================================================

/// The price fields of the item form. Normally exactly one is filled.
///
/// ## Precedence
/// The first *valid* price wins, USD before VES. A price is valid when it is
/// finite and not negative. A caller that fills both gets the USD price.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceInput {
    pub usd: Option<f64>,
    pub ves: Option<f64>,
}

impl PriceInput {
    /// A price entered in USD.
    pub fn usd(amount: f64) -> Self {
        PriceInput {
            usd: Some(amount),
            ves: None,
        }
    }

    /// A price entered in VES.
    pub fn ves(amount: f64) -> Self {
        PriceInput {
            usd: None,
            ves: Some(amount),
        }
    }
}

/// A resolved unit price in the currency the user typed it in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub currency: Currency,
    pub amount: f64,
}

impl Price {
    /// Returns `(price_usd, price_ves)`, deriving the missing side from `rate`.
    pub fn split(&self, rate: ExchangeRate) -> (f64, f64) {
        match self.currency {
            Currency::Usd => (self.amount, rate.usd_to_ves(self.amount)),
            Currency::Ves => (rate.ves_to_usd(self.amount), self.amount),
        }
    }
}

/// Input for adding or editing an item, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    pub name: String,
    #[ts(type = "number")]
    pub quantity: i64,
    pub price: PriceInput,
}

impl ItemDraft {
    /// Draft priced in USD.
    pub fn usd(name: impl Into<String>, quantity: i64, price_usd: f64) -> Self {
        ItemDraft {
            name: name.into(),
            quantity,
            price: PriceInput::usd(price_usd),
        }
    }

    /// Draft priced in VES.
    pub fn ves(name: impl Into<String>, quantity: i64, price_ves: f64) -> Self {
        ItemDraft {
            name: name.into(),
            quantity,
            price: PriceInput::ves(price_ves),
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One budget line: a name, a quantity and a unit price in both currencies.
///
/// ## Price Freezing
/// Both prices are fixed when the item is created or edited. If the exchange
/// rate changes afterwards the item keeps the figures it was given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: ItemId,
    pub name: String,
    pub quantity: u32,
    pub price_usd: f64,
    pub price_ves: f64,
    /// `quantity × price_usd`
    pub total_usd: f64,
    /// `quantity × price_ves`
    pub total_ves: f64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl LineItem {
    /// Builds an item from validated input at the given rate.
    pub(crate) fn new(id: ItemId, input: ValidatedItem, rate: ExchangeRate) -> Self {
        let mut item = LineItem {
            id,
            name: String::new(),
            quantity: 0,
            price_usd: 0.0,
            price_ves: 0.0,
            total_usd: 0.0,
            total_ves: 0.0,
            created_at: Utc::now(),
        };
        item.apply(input, rate);
        item
    }

    /// Replaces name, quantity, both prices and both totals.
    pub(crate) fn apply(&mut self, input: ValidatedItem, rate: ExchangeRate) {
        let (price_usd, price_ves) = input.price.split(rate);
        let quantity = f64::from(input.quantity);

        self.name = input.name;
        self.quantity = input.quantity;
        self.price_usd = price_usd;
        self.price_ves = price_ves;
        self.total_usd = quantity * price_usd;
        self.total_ves = quantity * price_ves;
    }
}

// =============================================================================
// Partial Total
// =============================================================================

/// A named, frozen group of line items and their aggregate value.
///
/// ## Totals Policy
/// Both totals are sums over the items: `total_usd = Σ item.total_usd` and
/// `total_ves = Σ item.total_ves`. They are recomputed the same way on
/// creation and after every nested edit or delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PartialTotal {
    pub id: PartialTotalId,
    pub name: String,
    pub total_usd: f64,
    pub total_ves: f64,
    pub items: Vec<LineItem>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl PartialTotal {
    /// Creates a partial total that owns `items`.
    pub(crate) fn new(id: PartialTotalId, name: String, items: Vec<LineItem>) -> Self {
        let mut partial = PartialTotal {
            id,
            name,
            total_usd: 0.0,
            total_ves: 0.0,
            items,
            created_at: Utc::now(),
        };
        partial.recompute_totals();
        partial
    }

    /// Re-sums both totals from the items.
    pub(crate) fn recompute_totals(&mut self) {
        self.total_usd = self.items.iter().map(|i| i.total_usd).sum();
        self.total_ves = self.items.iter().map(|i| i.total_ves).sum();
    }

    /// Number of items in the group.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

// =============================================================================
// Exchange Rate Status
// =============================================================================

/// Where the effective exchange rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RateStatus {
    /// The fetch has not settled yet; the fallback rate is in effect.
    #[default]
    Pending,
    /// A valid rate was fetched.
    Fetched,
    /// The fetch failed or returned an invalid value; the fallback is in effect.
    Fallback,
}

impl RateStatus {
    /// True once the rate can no longer change for this session.
    pub const fn is_settled(&self) -> bool {
        !matches!(self, RateStatus::Pending)
    }
}

/// Snapshot of the exchange-rate state for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RateInfo {
    /// The rate conversions currently use.
    pub rate: f64,
    pub status: RateStatus,
    pub fallback_rate: f64,
    #[ts(as = "Option<String>")]
    pub settled_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Aggregates
// =============================================================================

/// Totals over the whole session, computed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Aggregates {
    /// Σ total_usd over the uncommitted items.
    pub current_subtotal_usd: f64,
    /// `current_subtotal_usd × effective rate`.
    pub current_subtotal_ves: f64,
    /// Uncommitted subtotal plus every partial total.
    pub grand_total_usd: f64,
    pub grand_total_ves: f64,
    /// Grand totals with the markup applied.
    pub final_total_usd: f64,
    pub final_total_ves: f64,
    pub markup: Markup,
    pub item_count: u32,
    pub partial_total_count: u32,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_split_from_usd() {
        let rate = ExchangeRate::new(40.0).unwrap();
        let price = Price {
            currency: Currency::Usd,
            amount: 3.0,
        };
        assert_eq!(price.split(rate), (3.0, 120.0));
    }

    #[test]
    fn test_price_split_from_ves() {
        let rate = ExchangeRate::new(40.0).unwrap();
        let price = Price {
            currency: Currency::Ves,
            amount: 80.0,
        };
        assert_eq!(price.split(rate), (2.0, 80.0));
    }

    #[test]
    fn test_rate_status_settled() {
        assert!(!RateStatus::Pending.is_settled());
        assert!(RateStatus::Fetched.is_settled());
        assert!(RateStatus::Fallback.is_settled());
    }

    #[test]
    fn test_scope_serialization() {
        let json = serde_json::to_string(&ItemScope::Partial(PartialTotalId(7))).unwrap();
        assert_eq!(json, r#"{"kind":"partial","partialTotalId":7}"#);

        let json = serde_json::to_string(&ItemScope::Uncommitted).unwrap();
        assert_eq!(json, r#"{"kind":"uncommitted"}"#);

        let scope: ItemScope = serde_json::from_str(r#"{"kind":"uncommitted"}"#).unwrap();
        assert_eq!(scope, ItemScope::Uncommitted);
    }

    #[test]
    fn test_line_item_serializes_camel_case() {
        let item = LineItem {
            id: ItemId(1),
            name: "Sugar".to_string(),
            quantity: 2,
            price_usd: 3.0,
            price_ves: 120.0,
            total_usd: 6.0,
            total_ves: 240.0,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["priceVes"], 120.0);
        assert_eq!(value["totalUsd"], 6.0);
        assert_eq!(value["id"], 1);
    }
}
