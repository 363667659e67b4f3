//! # Rate Commands
//!
//! Exchange-rate display and the live conversion preview of the item form.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use cambio_core::{Currency, RateInfo};

use crate::commands::number_from_value;
use crate::state::{BudgetState, DisplaySettings};

/// Current exchange-rate state plus its display line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateResponse {
    #[serde(flatten)]
    pub info: RateInfo,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewArgs {
    /// The typed amount, as a number or as the raw input text.
    #[serde(default)]
    pub amount: Value,
    pub from: Currency,
}

/// Value for the other price field while the user types.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub to: Currency,
    /// `None` when the typed text is not a number; the field is left alone.
    pub converted: Option<f64>,
    /// `converted` with two decimals, ready for an input field.
    pub input_value: Option<String>,
}

/// Gets the exchange rate and its label.
pub fn get_rate(budget: &BudgetState, display: &DisplaySettings) -> RateResponse {
    debug!("get_rate command");

    let info = budget.with_engine(|engine| engine.rate_info());
    RateResponse {
        label: display.rate_label(&info),
        info,
    }
}

/// Converts the amount typed in one price field into the other currency.
pub fn preview_conversion(budget: &BudgetState, args: PreviewArgs) -> PreviewResponse {
    debug!(from = %args.from, "preview_conversion command");

    let converted = number_from_value(&args.amount)
        .and_then(|amount| budget.with_engine(|engine| engine.preview_conversion(amount, args.from)));

    PreviewResponse {
        to: args.from.counterpart(),
        converted,
        input_value: converted.map(|value| format!("{:.2}", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cambio_core::{BudgetEngine, Markup, RateStatus};
    use serde_json::json;

    fn budget_at(rate: f64) -> BudgetState {
        let mut engine = BudgetEngine::new();
        engine.set_exchange_rate(rate);
        BudgetState::new(engine, Markup::NONE)
    }

    #[test]
    fn test_get_rate_pending() {
        let budget = BudgetState::default();
        let response = get_rate(&budget, &DisplaySettings::default());
        assert_eq!(response.info.status, RateStatus::Pending);
        assert_eq!(response.label, "36,00 (cargando)");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["rate"], 36.0);
        assert_eq!(json["label"], "36,00 (cargando)");
    }

    #[test]
    fn test_preview_from_usd_text() {
        let budget = budget_at(40.0);
        let response = preview_conversion(
            &budget,
            PreviewArgs {
                amount: json!("3"),
                from: Currency::Usd,
            },
        );
        assert_eq!(response.to, Currency::Ves);
        assert_eq!(response.converted, Some(120.0));
        assert_eq!(response.input_value.as_deref(), Some("120.00"));
    }

    #[test]
    fn test_preview_from_ves_number() {
        let budget = budget_at(36.71);
        let response = preview_conversion(
            &budget,
            PreviewArgs {
                amount: json!(100),
                from: Currency::Ves,
            },
        );
        assert_eq!(response.to, Currency::Usd);
        assert_eq!(response.input_value.as_deref(), Some("2.72"));
    }

    #[test]
    fn test_preview_ignores_garbage() {
        let budget = budget_at(40.0);
        let response = preview_conversion(
            &budget,
            PreviewArgs {
                amount: json!("12abc"),
                from: Currency::Usd,
            },
        );
        assert_eq!(response.converted, None);
        assert_eq!(response.input_value, None);
    }
}
