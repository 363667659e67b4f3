//! # Commands Module
//!
//! All commands exposed to the rendering layer.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (exports)
//! ├── budget.rs   ◄─── Items, partial totals, markup
//! ├── rate.rs     ◄─── Exchange rate, conversion preview
//! └── config.rs   ◄─── Configuration retrieval
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  Rendering layer writes one line to stdin:                              │
//! │  {"id": 4, "command": "add_item",                                       │
//! │   "args": {"name": "Sugar", "quantity": 2, "priceUsd": 3}}              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ipc::dispatch ──► commands::budget::add_item(                          │
//! │                        &BudgetState,          ◄── shared state          │
//! │                        &dyn BudgetEventEmitter,                         │
//! │                        ItemArgs,              ◄── from "args"           │
//! │                    ) -> Result<BudgetResponse, ApiError>                │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Bridge writes one line to stdout:                                      │
//! │  {"id": 4, "ok": true, "data": {"items": [...], ...}}                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each command declares only the state it needs.

pub mod budget;
pub mod config;
pub mod rate;

use serde_json::Value;

/// Reads a number from a JSON number or from numeric text.
pub(crate) fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}
