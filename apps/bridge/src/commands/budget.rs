//! # Budget Commands
//!
//! Commands for items, partial totals and the markup.
//!
//! ## Command Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. One engine mutation        budget.with_engine_mut(|e| e.add_item()) │
//! │                                         │                               │
//! │  2. Recompute                  compute_aggregates(markup)               │
//! │                                         │                               │
//! │  3. Notify                     emitter.emit_changed(&aggregates)        │
//! │                                         │                               │
//! │  4. Respond                    BudgetResponse (full snapshot)           │
//! │                                                                         │
//! │  A failed mutation stops at step 1: no recompute, no event.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use cambio_core::validation::ValidationResult;
use cambio_core::{
    Aggregates, Currency, ItemDraft, ItemId, ItemScope, LineItem, Markup, PartialTotal,
    PartialTotalId, RateInfo,
};

use crate::commands::number_from_value;
use crate::error::ApiError;
use crate::events::BudgetEventEmitter;
use crate::state::{BudgetState, DisplaySettings};

// =============================================================================
// Responses
// =============================================================================

/// Everything the rendering layer needs to redraw the budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetResponse {
    pub items: Vec<LineItem>,
    pub partial_totals: Vec<PartialTotal>,
    pub aggregates: Aggregates,
    pub rate: RateInfo,
}

/// Totals rendered for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedTotals {
    pub current_subtotal_usd: String,
    pub current_subtotal_ves: String,
    pub grand_total_usd: String,
    pub grand_total_ves: String,
    pub final_total_usd: String,
    pub final_total_ves: String,
    pub rate: String,
}

/// Builds a snapshot without notifying anyone.
fn snapshot(budget: &BudgetState) -> BudgetResponse {
    let markup = budget.markup();
    budget.with_engine(|engine| BudgetResponse {
        items: engine.items().to_vec(),
        partial_totals: engine.partial_totals().to_vec(),
        aggregates: engine.compute_aggregates(markup),
        rate: engine.rate_info(),
    })
}

/// Recompute and notify step run after every mutation.
fn refresh(budget: &BudgetState, emitter: &dyn BudgetEventEmitter) -> BudgetResponse {
    let response = snapshot(budget);
    emitter.emit_changed(&response.aggregates);
    response
}

fn scope_of(partial_total_id: Option<PartialTotalId>) -> ItemScope {
    partial_total_id.map_or(ItemScope::Uncommitted, ItemScope::Partial)
}

// =============================================================================
// Arguments
// =============================================================================

/// Fields of the item form, as typed.
///
/// Each field may be a JSON number or the raw text of the input. Missing,
/// blank or malformed values are reported as validation errors, not as
/// protocol errors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemArgs {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quantity: Value,
    #[serde(default)]
    pub price_usd: Value,
    #[serde(default)]
    pub price_ves: Value,
}

impl ItemArgs {
    /// Validates the form fields into a draft.
    pub fn to_draft(&self) -> ValidationResult<ItemDraft> {
        ItemDraft::from_form(
            &self.name,
            &form_text(&self.quantity),
            &form_text(&self.price_usd),
            &form_text(&self.price_ves),
        )
    }
}

/// Renders a field value the way the form input would hold it.
fn form_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Arguments of `edit_item`. Without `partialTotalId` the item is looked up
/// in the current budget.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditItemArgs {
    pub item_id: ItemId,
    #[serde(default)]
    pub partial_total_id: Option<PartialTotalId>,
    #[serde(flatten)]
    pub item: ItemArgs,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteItemArgs {
    pub item_id: ItemId,
    #[serde(default)]
    pub partial_total_id: Option<PartialTotalId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePartialTotalArgs {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialTotalArgs {
    pub partial_total_id: PartialTotalId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenamePartialTotalArgs {
    pub partial_total_id: PartialTotalId,
    pub name: String,
}

/// The markup field accepts a number or the raw text of the input.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPercentageArgs {
    #[serde(default)]
    pub percentage: Value,
}

// =============================================================================
// Commands
// =============================================================================

/// Gets the whole budget.
pub fn get_budget(budget: &BudgetState) -> BudgetResponse {
    debug!("get_budget command");
    snapshot(budget)
}

/// Adds an item to the current budget.
pub fn add_item(
    budget: &BudgetState,
    emitter: &dyn BudgetEventEmitter,
    args: ItemArgs,
) -> Result<BudgetResponse, ApiError> {
    debug!(name = %args.name, quantity = %args.quantity, "add_item command");

    let draft = args.to_draft()?;
    budget.with_engine_mut(|engine| engine.add_item(&draft))?;

    Ok(refresh(budget, emitter))
}

/// Edits an item in the current budget or inside a partial total.
pub fn edit_item(
    budget: &BudgetState,
    emitter: &dyn BudgetEventEmitter,
    args: EditItemArgs,
) -> Result<BudgetResponse, ApiError> {
    let scope = scope_of(args.partial_total_id);
    debug!(item_id = %args.item_id, scope = ?scope, "edit_item command");

    let draft = args.item.to_draft()?;
    budget.with_engine_mut(|engine| engine.edit_item(args.item_id, scope, &draft))?;

    Ok(refresh(budget, emitter))
}

/// Deletes an item. Unknown ids leave the budget unchanged.
pub fn delete_item(
    budget: &BudgetState,
    emitter: &dyn BudgetEventEmitter,
    args: DeleteItemArgs,
) -> BudgetResponse {
    let scope = scope_of(args.partial_total_id);
    debug!(item_id = %args.item_id, scope = ?scope, "delete_item command");

    budget.with_engine_mut(|engine| engine.delete_item(args.item_id, scope));

    refresh(budget, emitter)
}

/// Moves every current item into a new partial total.
pub fn create_partial_total(
    budget: &BudgetState,
    emitter: &dyn BudgetEventEmitter,
    args: CreatePartialTotalArgs,
) -> Result<BudgetResponse, ApiError> {
    let name = args.name.unwrap_or_default();
    debug!(name = %name, "create_partial_total command");

    budget.with_engine_mut(|engine| engine.create_partial_total(&name))?;

    Ok(refresh(budget, emitter))
}

/// Deletes a partial total. Unknown ids leave the budget unchanged.
pub fn delete_partial_total(
    budget: &BudgetState,
    emitter: &dyn BudgetEventEmitter,
    args: PartialTotalArgs,
) -> BudgetResponse {
    debug!(partial_total_id = %args.partial_total_id, "delete_partial_total command");

    budget.with_engine_mut(|engine| engine.delete_partial_total(args.partial_total_id));

    refresh(budget, emitter)
}

/// Renames a partial total.
pub fn rename_partial_total(
    budget: &BudgetState,
    emitter: &dyn BudgetEventEmitter,
    args: RenamePartialTotalArgs,
) -> Result<BudgetResponse, ApiError> {
    debug!(partial_total_id = %args.partial_total_id, "rename_partial_total command");

    budget.with_engine_mut(|engine| engine.rename_partial_total(args.partial_total_id, &args.name))?;

    Ok(refresh(budget, emitter))
}

/// Sets the markup. Anything that is not a number means 0%.
pub fn set_percentage(
    budget: &BudgetState,
    emitter: &dyn BudgetEventEmitter,
    args: SetPercentageArgs,
) -> BudgetResponse {
    let markup = match &args.percentage {
        Value::String(text) => Markup::parse(text),
        other => number_from_value(other).map_or(Markup::NONE, Markup::from_percent),
    };
    debug!(markup = %markup, "set_percentage command");

    budget.set_markup(markup);

    refresh(budget, emitter)
}

/// Gets the totals formatted for display.
pub fn get_formatted_totals(budget: &BudgetState, display: &DisplaySettings) -> FormattedTotals {
    debug!("get_formatted_totals command");

    let totals = budget.aggregates();
    let rate = budget.with_engine(|engine| engine.rate_info());

    FormattedTotals {
        current_subtotal_usd: display.format_money(totals.current_subtotal_usd, Currency::Usd),
        current_subtotal_ves: display.format_money(totals.current_subtotal_ves, Currency::Ves),
        grand_total_usd: display.format_money(totals.grand_total_usd, Currency::Usd),
        grand_total_ves: display.format_money(totals.grand_total_ves, Currency::Ves),
        final_total_usd: display.format_money(totals.final_total_usd, Currency::Usd),
        final_total_ves: display.format_money(totals.final_total_ves, Currency::Ves),
        rate: display.rate_label(&rate),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
