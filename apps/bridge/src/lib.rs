//! # Cambio Bridge Library
//!
//! The session process between the budget engine and the rendering layer.
//!
//! ## Module Organization
//! ```text
//! cambio_bridge_lib/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── budget.rs   ◄─── Engine + markup behind Arc<Mutex>
//! │   ├── config.rs   ◄─── cambio.toml, number formatting
//! │   └── rate.rs     ◄─── One-shot exchange-rate initialization
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command exports
//! │   ├── budget.rs   ◄─── Items, partial totals, markup
//! │   ├── rate.rs     ◄─── Rate display, conversion preview
//! │   └── config.rs   ◄─── Configuration retrieval
//! ├── events.rs       ◄─── Change notifications
//! ├── ipc.rs          ◄─── JSON-lines protocol and serve loop
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod commands;
pub mod error;
pub mod events;
pub mod ipc;
pub mod state;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use cambio_core::{BudgetEngine, Markup};
use cambio_rates::{FixedRateProvider, HttpRateProvider, RateProvider};

use events::{BudgetEventEmitter, ChannelEmitter};
use ipc::BridgeContext;
use state::{initialize_exchange_rate, AppConfig, BudgetState};

/// Runs the bridge until stdin closes.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Bridge Startup                                    │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter, written to stderr             │
/// │     • Default: info,cambio=debug, can be overridden with RUST_LOG       │
/// │                                                                         │
/// │  2. Load Configuration ───────────────────────────────────────────────► │
/// │     • CAMBIO_CONFIG or the platform config dir                          │
/// │     • Invalid file: warning, defaults                                   │
/// │                                                                         │
/// │  3. Initialize State ─────────────────────────────────────────────────► │
/// │     • BudgetEngine with the configured fallback rate                    │
/// │     • Starting markup from [budget] default_percentage                  │
/// │                                                                         │
/// │  4. Spawn Rate Fetch ─────────────────────────────────────────────────► │
/// │     • One request, never retried; failure means fallback                │
/// │                                                                         │
/// │  5. Serve IPC ────────────────────────────────────────────────────────► │
/// │     • stdin requests, stdout responses and events                       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn run() -> std::io::Result<()> {
    init_tracing();

    info!("Starting Cambio bridge");

    let config = AppConfig::load_or_default(None);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let (emitter, events) = ChannelEmitter::channel();
        let ctx = build_context(config, Arc::new(emitter))?;
        info!("State initialized");

        spawn_rate_fetch(&ctx);

        ipc::serve(&ctx, tokio::io::stdin(), tokio::io::stdout(), events).await
    })?;

    info!("Cambio bridge stopped");
    Ok(())
}

/// Builds the session state from configuration.
pub fn build_context(
    config: AppConfig,
    emitter: Arc<dyn BudgetEventEmitter>,
) -> std::io::Result<BridgeContext> {
    let engine = BudgetEngine::with_fallback_rate(config.budget.fallback_rate)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    let markup = Markup::from_percent(config.budget.default_percentage);

    Ok(BridgeContext {
        budget: BudgetState::new(engine, markup),
        config: Arc::new(config),
        emitter,
    })
}

/// Starts the one-shot exchange-rate fetch in the background.
pub fn spawn_rate_fetch(ctx: &BridgeContext) {
    let rates = &ctx.config.rates;

    if !rates.enabled {
        info!("Rate fetching disabled, using fallback rate");
        spawn_with(ctx, FixedRateProvider::unavailable());
        return;
    }

    match HttpRateProvider::new(rates) {
        Ok(provider) => spawn_with(ctx, provider),
        Err(e) => {
            tracing::warn!(error = %e, "Cannot build rate provider, using fallback rate");
            spawn_with(ctx, FixedRateProvider::unavailable());
        }
    }
}

fn spawn_with<P>(ctx: &BridgeContext, provider: P)
where
    P: RateProvider + 'static,
{
    let budget = ctx.budget.clone();
    let emitter = ctx.emitter.clone();

    tokio::spawn(async move {
        initialize_exchange_rate(&budget, &provider, emitter.as_ref()).await;
    });
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=cambio_rates=trace` - Show trace for one crate only
/// - Default: INFO, DEBUG for cambio crates
///
/// Logs go to stderr; stdout carries the IPC protocol.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,cambio_core=debug,cambio_rates=debug,cambio_bridge_lib=debug")
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoOpEmitter;
    use cambio_core::RateStatus;

    #[test]
    fn test_build_context_uses_config() {
        let mut config = AppConfig::default();
        config.budget.fallback_rate = 38.0;
        config.budget.default_percentage = 5.0;

        let ctx = build_context(config, Arc::new(NoOpEmitter)).unwrap();

        assert_eq!(ctx.budget.markup().percent(), 5.0);
        let info = ctx.budget.with_engine(|engine| engine.rate_info());
        assert_eq!(info.rate, 38.0);
        assert_eq!(info.status, RateStatus::Pending);
    }

    #[tokio::test]
    async fn test_disabled_fetch_settles_on_fallback() {
        let mut config = AppConfig::default();
        config.rates.enabled = false;
        let (emitter, mut rx) = ChannelEmitter::channel();
        let ctx = build_context(config, Arc::new(emitter)).unwrap();

        spawn_rate_fetch(&ctx);

        let event = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            event,
            events::BudgetEvent::RateSettled(ref info) if info.status == RateStatus::Fallback
        ));
    }
}
