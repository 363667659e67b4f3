//! # Exchange Rate Initialization
//!
//! The one-shot fetch that settles the session's exchange rate.
//!
//! ```text
//!  startup ──spawn──► provider.fetch_rate()
//!                        │
//!          Ok(rate) ─────┼───── Err(e)
//!              │                  │
//!   set_exchange_rate(rate)   warn!(e), fall_back()
//!              │                  │
//!              └──► emit_rate, emit_changed ◄──┘
//! ```
//!
//! Commands are served against the fallback rate while this runs. Items
//! added before it settles keep the prices they were given.

use tracing::{info, warn};

use cambio_core::RateInfo;
use cambio_rates::RateProvider;

use crate::events::BudgetEventEmitter;
use crate::state::BudgetState;

/// Fetches the rate once and settles it on the engine.
///
/// A fetch failure is never surfaced as an error: it is logged and the
/// fallback rate takes effect. Returns the settled rate state.
pub async fn initialize_exchange_rate<P>(
    budget: &BudgetState,
    provider: &P,
    emitter: &dyn BudgetEventEmitter,
) -> RateInfo
where
    P: RateProvider,
{
    let outcome = provider.fetch_rate().await;

    let info = budget.with_engine_mut(|engine| {
        match outcome {
            Ok(rate) => {
                engine.set_exchange_rate(rate);
            }
            Err(e) => {
                warn!(error = %e, "Could not obtain exchange rate, using fallback");
                engine.fall_back();
            }
        }
        engine.rate_info()
    });

    info!(rate = info.rate, status = ?info.status, "Exchange rate settled");

    // The current subtotal in VES follows the rate, so totals change too.
    emitter.emit_rate(&info);
    emitter.emit_changed(&budget.aggregates());

    info
}
