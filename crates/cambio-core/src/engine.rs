//! # Budget Engine
//!
//! Owns one budget session: the uncommitted items, the partial totals and the
//! exchange-rate state.
//!
//! ## Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Budget Engine Operations                             │
//! │                                                                         │
//! │  User Action              Engine Call                 State Change      │
//! │  ───────────              ───────────                 ────────────      │
//! │                                                                         │
//! │  Add item ───────────────► add_item() ──────────────► items.push()      │
//! │                                                                         │
//! │  Save edit ──────────────► edit_item(scope) ────────► item replaced     │
//! │                                                       (+ partial re-sum)│
//! │                                                                         │
//! │  Delete item ────────────► delete_item(scope) ──────► item removed      │
//! │                                                                         │
//! │  Create partial ─────────► create_partial_total() ──► items moved into  │
//! │                                                       a new partial     │
//! │                                                                         │
//! │  Totals needed ──────────► compute_aggregates() ────► (read only)       │
//! │                                                                         │
//! │  NOTE: Mutations never recompute aggregates themselves. The caller      │
//! │        asks for them afterwards and decides who to notify.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Exchange Rate Lifecycle
//! ```text
//!   Pending ──set_exchange_rate(valid)──► Fetched
//!      │
//!      └────set_exchange_rate(invalid) / fall_back()──► Fallback
//!
//!   While Pending the fallback rate is already in effect.
//!   Fetched and Fallback are final for the session.
//! ```

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::currency::{Currency, ExchangeRate, Markup};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{
    Aggregates, ItemDraft, ItemId, ItemScope, LineItem, PartialTotal, PartialTotalId, RateInfo,
    RateStatus,
};
use crate::validation::{validate_item_draft, validate_partial_total_name};
use crate::DEFAULT_PARTIAL_TOTAL_PREFIX;

/// Exchange-rate state of a session.
#[derive(Debug, Clone)]
struct RateCell {
    effective: ExchangeRate,
    fallback: ExchangeRate,
    status: RateStatus,
    settled_at: Option<DateTime<Utc>>,
}

impl RateCell {
    fn new(fallback: ExchangeRate) -> Self {
        RateCell {
            effective: fallback,
            fallback,
            status: RateStatus::Pending,
            settled_at: None,
        }
    }

    fn settle(&mut self, rate: ExchangeRate, status: RateStatus) {
        self.effective = rate;
        self.status = status;
        self.settled_at = Some(Utc::now());
    }
}

/// The Currency & Totals Engine.
///
/// ## Invariants
/// - Ids are unique and increase with creation order
/// - A partial total's totals always equal the sums over its items
/// - The exchange rate is settled at most once
#[derive(Debug, Clone)]
pub struct BudgetEngine {
    items: Vec<LineItem>,
    partial_totals: Vec<PartialTotal>,
    rate: RateCell,
    next_id: u32,
}

impl BudgetEngine {
    /// Creates an empty session using the built-in 36.00 fallback rate.
    pub fn new() -> Self {
        Self::with_fallback(ExchangeRate::FALLBACK)
    }

    /// Creates an empty session with a configured fallback rate.
    pub fn with_fallback(fallback: ExchangeRate) -> Self {
        BudgetEngine {
            items: Vec::new(),
            partial_totals: Vec::new(),
            rate: RateCell::new(fallback),
            next_id: 1,
        }
    }

    /// Like [`BudgetEngine::with_fallback`], for a raw configured value.
    pub fn with_fallback_rate(fallback: f64) -> CoreResult<Self> {
        let fallback = ExchangeRate::new(fallback).ok_or_else(|| ValidationError::MustBePositive {
            field: "fallback rate".to_string(),
        })?;
        Ok(Self::with_fallback(fallback))
    }

    fn next_id(&mut self) -> CoreResult<u32> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(CoreError::IdsExhausted)?;
        Ok(id)
    }

    // =========================================================================
    // Exchange Rate
    // =========================================================================

    /// Settles the exchange rate from an externally supplied value.
    ///
    /// A non-finite or non-positive `rate` settles on the fallback instead.
    /// Nothing is raised; the outcome is visible in the returned status.
    /// Once settled, further calls are ignored.
    pub fn set_exchange_rate(&mut self, rate: f64) -> RateStatus {
        if self.rate.status.is_settled() {
            warn!(
                rate,
                status = ?self.rate.status,
                "Exchange rate already settled, ignoring new value"
            );
            return self.rate.status;
        }

        match ExchangeRate::new(rate) {
            Some(valid) => {
                info!(rate = valid.value(), "Exchange rate set");
                self.rate.settle(valid, RateStatus::Fetched);
            }
            None => {
                warn!(rate, fallback = self.rate.fallback.value(), "Invalid exchange rate, using fallback");
                self.rate.settle(self.rate.fallback, RateStatus::Fallback);
            }
        }
        self.rate.status
    }

    /// Settles the exchange rate on the fallback, e.g. after a failed fetch.
    pub fn fall_back(&mut self) -> RateStatus {
        if self.rate.status.is_settled() {
            warn!(status = ?self.rate.status, "Exchange rate already settled, ignoring fallback");
            return self.rate.status;
        }

        let fallback = self.fallback_rate();
        info!(fallback = fallback.value(), "Using fallback exchange rate");
        self.rate.settle(fallback, RateStatus::Fallback);
        self.rate.status
    }

    /// The rate conversions use right now.
    pub fn exchange_rate(&self) -> ExchangeRate {
        self.rate.effective
    }

    pub fn rate_status(&self) -> RateStatus {
        self.rate.status
    }

    pub fn fallback_rate(&self) -> ExchangeRate {
        self.rate.fallback
    }

    /// Snapshot of the rate state for display.
    pub fn rate_info(&self) -> RateInfo {
        RateInfo {
            rate: self.rate.effective.value(),
            status: self.rate.status,
            fallback_rate: self.fallback_rate().value(),
            settled_at: self.rate.settled_at,
        }
    }

    /// Converts a typed amount into the other currency for a live preview.
    ///
    /// Returns `None` when `amount` is not a finite number.
    pub fn preview_conversion(&self, amount: f64, from: Currency) -> Option<f64> {
        if !amount.is_finite() {
            return None;
        }
        Some(self.rate.effective.convert(amount, from))
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// Appends a new item to the current budget.
    ///
    /// ## Returns
    /// - `Ok(LineItem)` with both prices and totals filled in
    /// - `Err(CoreError::Validation)` for a blank name, a quantity below 1,
    ///   or no valid price
    pub fn add_item(&mut self, draft: &ItemDraft) -> CoreResult<LineItem> {
        let input = validate_item_draft(draft)?;
        let id = ItemId(self.next_id()?);
        let item = LineItem::new(id, input, self.rate.effective);

        debug!(
            item_id = %item.id,
            name = %item.name,
            quantity = item.quantity,
            total_usd = item.total_usd,
            "Item added"
        );

        self.items.push(item.clone());
        Ok(item)
    }

    /// Replaces an item's name, quantity, prices and totals in place.
    ///
    /// The missing price is derived at the current rate. When the item lives
    /// in a partial total, that partial's totals are re-summed.
    ///
    /// ## Returns
    /// - `Err(CoreError::Validation)` on bad input (checked first)
    /// - `Err(CoreError::ItemNotFound / PartialTotalNotFound)` for stale ids;
    ///   state is left unchanged
    pub fn edit_item(
        &mut self,
        item_id: ItemId,
        scope: ItemScope,
        draft: &ItemDraft,
    ) -> CoreResult<LineItem> {
        let input = validate_item_draft(draft)?;
        let rate = self.rate.effective;
        let not_found = CoreError::ItemNotFound { item_id, scope };

        let updated = match scope {
            ItemScope::Uncommitted => {
                let item = self
                    .items
                    .iter_mut()
                    .find(|i| i.id == item_id)
                    .ok_or(not_found)?;
                item.apply(input, rate);
                item.clone()
            }
            ItemScope::Partial(partial_id) => {
                let partial = self
                    .partial_totals
                    .iter_mut()
                    .find(|p| p.id == partial_id)
                    .ok_or(CoreError::PartialTotalNotFound(partial_id))?;
                let item = partial
                    .items
                    .iter_mut()
                    .find(|i| i.id == item_id)
                    .ok_or(not_found)?;
                item.apply(input, rate);
                let updated = item.clone();
                partial.recompute_totals();
                updated
            }
        };

        debug!(item_id = %item_id, scope = ?scope, "Item edited");
        Ok(updated)
    }

    /// Removes an item. An unknown id is a silent no-op returning `None`.
    pub fn delete_item(&mut self, item_id: ItemId, scope: ItemScope) -> Option<LineItem> {
        let removed = match scope {
            ItemScope::Uncommitted => take_item(&mut self.items, item_id),
            ItemScope::Partial(partial_id) => {
                let partial = self.partial_totals.iter_mut().find(|p| p.id == partial_id)?;
                let removed = take_item(&mut partial.items, item_id);
                if removed.is_some() {
                    partial.recompute_totals();
                }
                removed
            }
        };

        match &removed {
            Some(_) => debug!(item_id = %item_id, scope = ?scope, "Item deleted"),
            None => debug!(item_id = %item_id, scope = ?scope, "Item to delete not found, nothing to do"),
        }
        removed
    }

    /// Items not yet grouped into a partial total, in creation order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    // =========================================================================
    // Partial Totals
    // =========================================================================

    /// Groups every current item into a new partial total.
    ///
    /// ## Naming
    /// A blank `name` becomes `"Total Parcial N"` with N = number of live
    /// partial totals + 1. N follows the live count, so a number can come
    /// back after a deletion.
    ///
    /// ## Returns
    /// - `Err(CoreError::EmptyBudget)` if there are no current items
    /// - otherwise the new partial total; the current list is now empty
    pub fn create_partial_total(&mut self, name: &str) -> CoreResult<PartialTotal> {
        if self.items.is_empty() {
            return Err(CoreError::EmptyBudget);
        }

        let name = match name.trim() {
            "" => format!(
                "{} {}",
                DEFAULT_PARTIAL_TOTAL_PREFIX,
                self.partial_totals.len() + 1
            ),
            trimmed => trimmed.to_string(),
        };

        let id = PartialTotalId(self.next_id()?);
        let items = std::mem::take(&mut self.items);
        let partial = PartialTotal::new(id, name, items);

        debug!(
            partial_total_id = %partial.id,
            name = %partial.name,
            items = partial.item_count(),
            total_usd = partial.total_usd,
            "Partial total created"
        );

        self.partial_totals.push(partial.clone());
        Ok(partial)
    }

    /// Removes a partial total. An unknown id is a no-op returning `None`.
    pub fn delete_partial_total(&mut self, id: PartialTotalId) -> Option<PartialTotal> {
        let Some(index) = self.partial_totals.iter().position(|p| p.id == id) else {
            debug!(partial_total_id = %id, "Partial total to delete not found, nothing to do");
            return None;
        };

        debug!(partial_total_id = %id, "Partial total deleted");
        Some(self.partial_totals.remove(index))
    }

    /// Renames a partial total. The name is stored trimmed.
    pub fn rename_partial_total(&mut self, id: PartialTotalId, name: &str) -> CoreResult<PartialTotal> {
        let name = validate_partial_total_name(name)?;

        let partial = self
            .partial_totals
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(CoreError::PartialTotalNotFound(id))?;
        partial.name = name;

        debug!(partial_total_id = %id, name = %partial.name, "Partial total renamed");
        Ok(partial.clone())
    }

    /// Partial totals in creation order.
    pub fn partial_totals(&self) -> &[PartialTotal] {
        &self.partial_totals
    }

    pub fn partial_total(&self, id: PartialTotalId) -> Option<&PartialTotal> {
        self.partial_totals.iter().find(|p| p.id == id)
    }

    // =========================================================================
    // Aggregates
    // =========================================================================

    /// Computes every session total. Read only.
    pub fn compute_aggregates(&self, markup: Markup) -> Aggregates {
        let current_subtotal_usd: f64 = self.items.iter().map(|i| i.total_usd).sum();
        let current_subtotal_ves = self.rate.effective.usd_to_ves(current_subtotal_usd);

        let partials_usd: f64 = self.partial_totals.iter().map(|p| p.total_usd).sum();
        let partials_ves: f64 = self.partial_totals.iter().map(|p| p.total_ves).sum();

        let grand_total_usd = current_subtotal_usd + partials_usd;
        let grand_total_ves = current_subtotal_ves + partials_ves;

        Aggregates {
            current_subtotal_usd,
            current_subtotal_ves,
            grand_total_usd,
            grand_total_ves,
            final_total_usd: markup.apply(grand_total_usd),
            final_total_ves: markup.apply(grand_total_ves),
            markup,
            item_count: self.items.len() as u32,
            partial_total_count: self.partial_totals.len() as u32,
        }
    }
}

impl Default for BudgetEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn take_item(items: &mut Vec<LineItem>, item_id: ItemId) -> Option<LineItem> {
    let index = items.iter().position(|i| i.id == item_id)?;
    Some(items.remove(index))
}

// =============================================================================
// Unit Tests
// =============================================================================
