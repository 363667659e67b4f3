//! # Error Types
//!
//! Domain-specific error types for cambio-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cambio-core errors (this file)                                        │
//! │  ├── CoreError        - Budget rule violations, stale ids              │
//! │  └── ValidationError  - Bad user input                                 │
//! │                                                                         │
//! │  cambio-rates errors (separate crate)                                  │
//! │  └── RateError        - Rate source unavailable (recovered by fallback)│
//! │                                                                         │
//! │  Bridge errors (in app)                                                │
//! │  └── ApiError         - What the rendering layer sees (serialized)     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → modal dialog           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here is fatal. Every variant leaves the session untouched and is
//! meant to be shown to the user.

use thiserror::Error;

use crate::types::{ItemId, ItemScope, PartialTotalId};

// =============================================================================
// Core Error
// =============================================================================

/// Budget operation errors.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    /// Tried to create a partial total while the current budget is empty.
    #[error("There are no items in the current budget to create a partial total")]
    EmptyBudget,

    /// The item id does not exist in the given scope.
    ///
    /// ## When This Occurs
    /// - The item was deleted in the meantime
    /// - The UI sent the wrong scope for the item
    #[error("Item {item_id} not found in {scope}")]
    ItemNotFound { item_id: ItemId, scope: ItemScope },

    /// The partial total id does not exist.
    #[error("Partial total not found: {0}")]
    PartialTotalNotFound(PartialTotalId),

    /// Every id this session can hand out is taken.
    #[error("No ids left for this session")]
    IdsExhausted,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for errors caused by a stale or unknown id.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::ItemNotFound { .. } | CoreError::PartialTotalNotFound(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be greater than zero.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value could not be read (not a number, too large, ...).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Neither the USD nor the VES price is a non-negative number.
    #[error("Enter a valid price in USD or VES")]
    NoValidPrice,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
