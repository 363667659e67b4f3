//! # cambio-core: Currency & Totals Engine
//!
//! This crate is the **heart** of Cambio. It holds the budget logic as plain
//! synchronous code with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cambio Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Rendering layer (web UI)                        │   │
//! │  │    Item form ──► Item list ──► Partial totals ──► Grand total   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON lines (stdin/stdout)              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    cambio-bridge commands                       │   │
//! │  │    add_item, edit_item, create_partial_total, set_percentage   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cambio-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ currency  │  │  engine   │  │ validation│  │   │
//! │  │   │ LineItem  │  │ Exchange  │  │  Budget   │  │   rules   │  │   │
//! │  │   │ Partial   │  │ Rate      │  │  Engine   │  │  parsing  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO GLOBALS                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                ▲                                        │
//! │  ┌─────────────────────────────┴───────────────────────────────────┐   │
//! │  │                cambio-rates (exchange-rate source)              │   │
//! │  │         one HTTP GET, result handed in as a plain f64           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (LineItem, PartialTotal, Aggregates, ...)
//! - [`currency`] - Currency, ExchangeRate and Markup
//! - [`engine`] - The session engine owning items and partial totals
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation and raw form parsing
//!
//! ## Design Principles
//!
//! 1. **Explicit session**: all state lives in one [`BudgetEngine`] value
//! 2. **No hidden recompute**: mutations return the changed entity, callers
//!    ask for [`Aggregates`] when they need them
//! 3. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use cambio_core::{BudgetEngine, ItemDraft, Markup};
//!
//! let mut engine = BudgetEngine::new();
//! engine.set_exchange_rate(40.0);
//!
//! let sugar = engine.add_item(&ItemDraft::usd("Sugar", 2, 3.0)).unwrap();
//! assert_eq!(sugar.price_ves, 120.0);
//!
//! let totals = engine.compute_aggregates(Markup::from_percent(10.0));
//! assert!((totals.final_total_usd - 6.6).abs() < 1e-9);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod currency;
pub mod engine;
pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use currency::{Currency, ExchangeRate, Markup};
pub use engine::BudgetEngine;
pub use error::{CoreError, CoreResult, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Exchange rate (VES per USD) used when the rate source is unavailable.
pub const DEFAULT_FALLBACK_RATE: f64 = 36.00;

/// Prefix for partial totals created without a name ("Total Parcial 3").
pub const DEFAULT_PARTIAL_TOTAL_PREFIX: &str = "Total Parcial";
