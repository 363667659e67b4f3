//! # Validation Module
//!
//! Input validation and raw form parsing for Cambio.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Rendering layer                                              │
//! │  └── Raw text from inputs ("2", "3.50", "")                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Form parsing (parse_quantity, parse_price, from_form)        │
//! │  └── Text → numbers; empty or garbage prices become "absent"           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Business rules (validate_item_draft)                         │
//! │  ├── name not blank, quantity > 0                                      │
//! │  └── first valid price wins, USD before VES                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cambio_core::validation::{validate_item_name, validate_quantity};
//!
//! assert_eq!(validate_item_name("  Sugar ").unwrap(), "Sugar");
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::currency::Currency;
use crate::error::ValidationError;
use crate::types::{ItemDraft, Price, PriceInput};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// An [`ItemDraft`] that passed every rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedItem {
    pub name: String,
    pub quantity: u32,
    pub price: Price,
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates an item name and returns it trimmed.
pub fn validate_item_name(name: &str) -> ValidationResult<String> {
    required_trimmed(name, "name")
}

/// Validates a partial total name and returns it trimmed.
///
/// ## Example
/// ```rust
/// use cambio_core::validation::validate_partial_total_name;
///
/// assert_eq!(validate_partial_total_name(" Groceries ").unwrap(), "Groceries");
/// assert!(validate_partial_total_name("   ").is_err());
/// ```
pub fn validate_partial_total_name(name: &str) -> ValidationResult<String> {
    required_trimmed(name, "partial total name")
}

fn required_trimmed(value: &str, field: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(value.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity: a positive integer.
pub fn validate_quantity(qty: i64) -> ValidationResult<u32> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    u32::try_from(qty).map_err(|_| ValidationError::InvalidFormat {
        field: "quantity".to_string(),
        reason: format!("must be at most {}", u32::MAX),
    })
}

/// Validates a unit price: finite and not negative. Zero is allowed.
pub fn validate_price(amount: f64) -> ValidationResult<f64> {
    if !amount.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: "must be a number".to_string(),
        });
    }

    if amount < 0.0 {
        return Err(ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: "must not be negative".to_string(),
        });
    }

    Ok(amount)
}

/// Picks the authoritative price: the first valid one, USD before VES.
pub fn resolve_price(input: &PriceInput) -> ValidationResult<Price> {
    let usd = input
        .usd
        .and_then(|amount| validate_price(amount).ok())
        .map(|amount| Price {
            currency: Currency::Usd,
            amount,
        });

    let ves = || {
        input
            .ves
            .and_then(|amount| validate_price(amount).ok())
            .map(|amount| Price {
                currency: Currency::Ves,
                amount,
            })
    };

    usd.or_else(ves).ok_or(ValidationError::NoValidPrice)
}

/// Runs every item rule: name, then quantity, then price.
pub fn validate_item_draft(draft: &ItemDraft) -> ValidationResult<ValidatedItem> {
    let name = validate_item_name(&draft.name)?;
    let quantity = validate_quantity(draft.quantity)?;
    let price = resolve_price(&draft.price)?;

    Ok(ValidatedItem {
        name,
        quantity,
        price,
    })
}

// =============================================================================
// Form Parsing
// =============================================================================

/// Parses the quantity field of the item form.
///
/// ## Example
/// ```rust
/// use cambio_core::validation::parse_quantity;
///
/// assert_eq!(parse_quantity(" 3 ").unwrap(), 3);
/// assert!(parse_quantity("").is_err());
/// assert!(parse_quantity("0").is_err());
/// assert!(parse_quantity("two").is_err());
/// ```
pub fn parse_quantity(text: &str) -> ValidationResult<i64> {
    let text = text.trim();

    if text.is_empty() {
        return Err(ValidationError::Required {
            field: "quantity".to_string(),
        });
    }

    let qty = text
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: "must be a whole number".to_string(),
        })?;

    validate_quantity(qty)?;
    Ok(qty)
}

/// Parses a price field. Empty, non-numeric or negative text is "absent".
///
/// ## Example
/// ```rust
/// use cambio_core::validation::parse_price;
///
/// assert_eq!(parse_price("3.50"), Some(3.5));
/// assert_eq!(parse_price("0"), Some(0.0));
/// assert_eq!(parse_price(""), None);
/// assert_eq!(parse_price("-1"), None);
/// ```
pub fn parse_price(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    text.parse::<f64>()
        .ok()
        .and_then(|amount| validate_price(amount).ok())
}

impl ItemDraft {
    /// Builds a draft from the raw text of the item form.
    ///
    /// Checks run in the order the form reports them: name and quantity
    /// first, then the prices.
    pub fn from_form(
        name: &str,
        quantity: &str,
        price_usd: &str,
        price_ves: &str,
    ) -> ValidationResult<ItemDraft> {
        let name = validate_item_name(name)?;
        let quantity = parse_quantity(quantity)?;

        let price = PriceInput {
            usd: parse_price(price_usd),
            ves: parse_price(price_ves),
        };
        resolve_price(&price)?;

        Ok(ItemDraft {
            name,
            quantity,
            price,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
